//! Persistence contract for dish records.

use crate::domain::listing::UnsupportedSortField;
use crate::domain::{Dish, DishListQuery, DishPatch, NewDish};
use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a [`DishRepository`]. Storage-engine errors never cross the
/// repository boundary unwrapped.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The unique constraint on `name` rejected the write. Nothing was committed.
    #[error("dish name '{name}' is already taken")]
    Conflict { name: String },

    #[error(transparent)]
    UnsupportedSortField(#[from] UnsupportedSortField),

    #[error("database operation failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Maps a unique-constraint violation to `Conflict`; everything else stays a database fault.
pub(crate) fn map_write_error(err: sqlx::Error, name: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict {
                name: name.to_string(),
            };
        }
    }
    RepositoryError::Database(err)
}

/// Each call runs in its own transaction and either commits or leaves nothing behind.
/// "Not found" is reported as `None`/`false`, never as an error.
#[async_trait]
pub trait DishRepository: Send + Sync {
    /// Inserts a dish, assigning `id`, `created_at` and `updated_at`.
    async fn create(&self, dish: &NewDish) -> Result<Dish, RepositoryError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Dish>, RepositoryError>;

    /// Exact, case-sensitive name lookup.
    async fn get_by_name(&self, name: &str) -> Result<Option<Dish>, RepositoryError>;

    async fn list_all(&self, query: &DishListQuery) -> Result<Vec<Dish>, RepositoryError>;

    /// Applies the fields present in `patch` and refreshes `updated_at`.
    /// Returns `None` when no dish has this id.
    async fn update(&self, id: i64, patch: &DishPatch) -> Result<Option<Dish>, RepositoryError>;

    /// Hard delete. Returns `false` when no dish has this id.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Cheap round-trip to the backing store.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
