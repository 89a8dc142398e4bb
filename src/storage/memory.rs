//! Process-local dish repository.
//!
//! Mirrors the Postgres repository's contract (unique names, search, sort whitelist,
//! pagination clamps, monotonically assigned ids) without a database. Used by the
//! `memory` storage backend and by tests.

use crate::domain::dish::{next_updated_at, now_micros};
use crate::domain::{Dish, DishListQuery, DishPatch, NewDish, SortDirection, SortField};
use crate::storage::repository::{DishRepository, RepositoryError};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    rows: BTreeMap<i64, Dish>,
}

impl MemoryState {
    fn name_taken(&self, name: &str, except_id: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|d| d.name == name && Some(d.id) != except_id)
    }
}

#[derive(Default)]
pub struct InMemoryDishRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryDishRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &Dish, b: &Dish, field: SortField, direction: SortDirection) -> Ordering {
    let primary = match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl DishRepository for InMemoryDishRepository {
    async fn create(&self, dish: &NewDish) -> Result<Dish, RepositoryError> {
        let mut state = self.state.write().await;
        if state.name_taken(&dish.name, None) {
            return Err(RepositoryError::Conflict {
                name: dish.name.clone(),
            });
        }

        state.last_id += 1;
        let now = now_micros();
        let created = Dish {
            id: state.last_id,
            name: dish.name.clone(),
            description: dish.description.clone(),
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Dish>, RepositoryError> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Dish>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.rows.values().find(|d| d.name == name).cloned())
    }

    async fn list_all(&self, query: &DishListQuery) -> Result<Vec<Dish>, RepositoryError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Dish> = state
            .rows
            .values()
            .filter(|d| query.matches_name(&d.name))
            .collect();
        matching.sort_by(|a, b| compare(a, b, query.order_by(), query.direction()));

        Ok(matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, patch: &DishPatch) -> Result<Option<Dish>, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(name) = &patch.name {
            if state.name_taken(name, Some(id)) {
                return Err(RepositoryError::Conflict { name: name.clone() });
            }
        }

        let Some(dish) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(dish);
        dish.updated_at = next_updated_at(dish.updated_at);
        Ok(Some(dish.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.state.write().await.rows.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
