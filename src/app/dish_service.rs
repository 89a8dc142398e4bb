//! Business rules for dishes.
//!
//! The service sits on top of a [`DishRepository`] and is responsible for:
//! 1.  Validating payloads before anything reaches storage.
//! 2.  Enforcing name uniqueness with a friendly `AlreadyExists` error, both through a
//!     pre-check and by remapping storage-level unique violations (the create race).
//! 3.  Turning "absent" repository results into `NotFound`.

use crate::domain::{Dish, DishListQuery, DishPatch, NewDish, DEFAULT_PAGE_SIZE};
use crate::storage::{DishRepository, RepositoryError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Dish with ID '{0}' not found.")]
    NotFound(i64),

    #[error("Dish with name '{0}' already exists.")]
    AlreadyExists(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { name } => ServiceError::AlreadyExists(name),
            other => ServiceError::Repository(other),
        }
    }
}

fn name_conflict(name: impl Into<String>) -> ServiceError {
    let name = name.into();
    tracing::warn!(name = %name, "dish name conflict");
    ServiceError::AlreadyExists(name)
}

/// Storage-level unique violations (a concurrent writer won the race) surface as conflicts.
fn write_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict { name } => name_conflict(name),
        other => ServiceError::from(other),
    }
}

/// Loosely typed listing parameters, as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDishesParams {
    pub search: Option<String>,
    pub order_by: String,
    pub direction: String,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListDishesParams {
    fn default() -> Self {
        Self {
            search: None,
            order_by: "id".to_string(),
            direction: "asc".to_string(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Stateless; cloning only clones the repository handle.
#[derive(Clone)]
pub struct DishService {
    repository: Arc<dyn DishRepository>,
}

impl DishService {
    pub fn new(repository: Arc<dyn DishRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn DishRepository> {
        &self.repository
    }

    pub async fn create(&self, input: NewDish) -> Result<Dish, ServiceError> {
        input.validate().map_err(ServiceError::Validation)?;

        if self.repository.get_by_name(&input.name).await?.is_some() {
            return Err(name_conflict(input.name));
        }

        let dish = self
            .repository
            .create(&input)
            .await
            .map_err(write_error)?;
        tracing::info!(dish_id = dish.id, name = %dish.name, "dish created");
        Ok(dish)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Dish, ServiceError> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn list(&self, params: ListDishesParams) -> Result<Vec<Dish>, ServiceError> {
        let query = DishListQuery::parse(
            params.search,
            &params.order_by,
            &params.direction,
            params.limit,
            params.offset,
        )
        .map_err(RepositoryError::from)?;

        Ok(self.repository.list_all(&query).await?)
    }

    pub async fn update(&self, id: i64, patch: DishPatch) -> Result<Dish, ServiceError> {
        patch.validate().map_err(ServiceError::Validation)?;

        let existing = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        if let Some(name) = patch.name.as_deref() {
            if name != existing.name && self.repository.get_by_name(name).await?.is_some() {
                return Err(name_conflict(name));
            }
        }

        // The row can disappear between the lookup and the write.
        let updated = self
            .repository
            .update(id, &patch)
            .await
            .map_err(write_error)?
            .ok_or(ServiceError::NotFound(id))?;
        tracing::info!(dish_id = id, "dish updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repository.delete(id).await? {
            return Err(ServiceError::NotFound(id));
        }
        tracing::info!(dish_id = id, "dish deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dish, DishListQuery};
    use crate::storage::InMemoryDishRepository;
    use async_trait::async_trait;

    fn service() -> DishService {
        DishService::new(Arc::new(InMemoryDishRepository::new()))
    }

    fn pizza() -> NewDish {
        NewDish::new("Pizza", Some("cheesy".to_string()))
    }

    #[tokio::test]
    async fn create_then_get_returns_submitted_fields() {
        let svc = service();
        let created = svc.create(pizza()).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = svc.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Pizza");
        assert_eq!(fetched.description.as_deref(), Some("cheesy"));
    }

    #[tokio::test]
    async fn duplicate_create_is_already_exists() {
        let svc = service();
        svc.create(pizza()).await.unwrap();
        let err = svc.create(NewDish::new("Pizza", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(name) if name == "Pizza"));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_storage() {
        let svc = service();
        let err = svc.create(NewDish::new("", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        svc.create(pizza()).await.unwrap();
        let err = svc
            .update(1, DishPatch::describe(Some("x".repeat(501))))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let svc = service();
        assert!(matches!(svc.get_by_id(7).await, Err(ServiceError::NotFound(7))));
        assert!(matches!(
            svc.update(7, DishPatch::default()).await,
            Err(ServiceError::NotFound(7))
        ));
        assert!(matches!(svc.delete(7).await, Err(ServiceError::NotFound(7))));
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let svc = service();
        let dish = svc.create(pizza()).await.unwrap();
        svc.delete(dish.id).await.unwrap();
        assert!(matches!(svc.delete(dish.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_keeps_unset_fields_and_clears_on_null() {
        let svc = service();
        let dish = svc.create(pizza()).await.unwrap();

        let updated = svc
            .update(dish.id, DishPatch::describe(Some("extra cheesy".to_string())))
            .await
            .unwrap();
        assert_eq!(updated.name, "Pizza");
        assert_eq!(updated.description.as_deref(), Some("extra cheesy"));
        assert!(updated.updated_at > dish.updated_at);
        assert_eq!(updated.created_at, dish.created_at);

        let cleared = svc.update(dish.id, DishPatch::describe(None)).await.unwrap();
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn rename_collision_is_already_exists() {
        let svc = service();
        svc.create(pizza()).await.unwrap();
        let pasta = svc.create(NewDish::new("Pasta", None)).await.unwrap();

        let err = svc
            .update(pasta.id, DishPatch::rename("Pizza"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));

        let renamed = svc
            .update(pasta.id, DishPatch::rename("Penne"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "Penne");
    }

    #[tokio::test]
    async fn rename_to_blank_is_invalid_and_to_own_name_is_allowed() {
        let svc = service();
        let dish = svc.create(pizza()).await.unwrap();

        for blank in ["", "   "] {
            let err = svc.update(dish.id, DishPatch::rename(blank)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }

        let same = svc.update(dish.id, DishPatch::rename("Pizza")).await.unwrap();
        assert_eq!(same.name, "Pizza");
        assert!(same.updated_at > dish.updated_at);
    }

    #[tokio::test]
    async fn unsupported_sort_field_is_a_repository_error() {
        let svc = service();
        let params = ListDishesParams {
            order_by: "price".to_string(),
            ..ListDishesParams::default()
        };
        let err = svc.list(params).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Repository(RepositoryError::UnsupportedSortField(_))
        ));
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let svc = service();
        for i in 0..8 {
            svc.create(NewDish::new(format!("Dish {}", i), None))
                .await
                .unwrap();
        }
        let params = ListDishesParams {
            limit: 5,
            ..ListDishesParams::default()
        };
        assert_eq!(svc.list(params).await.unwrap().len(), 5);
    }

    /// Repository whose name lookup never sees the competing row, as happens when two
    /// creates race past the pre-check.
    struct RacingRepository {
        inner: InMemoryDishRepository,
    }

    #[async_trait]
    impl DishRepository for RacingRepository {
        async fn create(&self, dish: &NewDish) -> Result<Dish, RepositoryError> {
            self.inner.create(dish).await
        }
        async fn get_by_id(&self, id: i64) -> Result<Option<Dish>, RepositoryError> {
            self.inner.get_by_id(id).await
        }
        async fn get_by_name(&self, _name: &str) -> Result<Option<Dish>, RepositoryError> {
            Ok(None)
        }
        async fn list_all(&self, query: &DishListQuery) -> Result<Vec<Dish>, RepositoryError> {
            self.inner.list_all(query).await
        }
        async fn update(
            &self,
            id: i64,
            patch: &DishPatch,
        ) -> Result<Option<Dish>, RepositoryError> {
            self.inner.update(id, patch).await
        }
        async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
            self.inner.delete(id).await
        }
        async fn ping(&self) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn storage_conflict_is_remapped_to_already_exists() {
        let svc = DishService::new(Arc::new(RacingRepository {
            inner: InMemoryDishRepository::new(),
        }));
        svc.create(pizza()).await.unwrap();

        let err = svc.create(NewDish::new("Pizza", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(name) if name == "Pizza"));

        let pasta = svc.create(NewDish::new("Pasta", None)).await.unwrap();
        let err = svc
            .update(pasta.id, DishPatch::rename("Pizza"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));
    }
}
