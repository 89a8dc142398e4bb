pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{DishService, ListDishesParams, ServiceError};
pub use domain::{Dish, DishListQuery, DishPatch, NewDish, SortDirection, SortField};
pub use infra::config::{AppConfig, StorageBackend};
pub use storage::{
    DishRepository, InMemoryDishRepository, PgDishRepository, RepositoryError, SqliteDishRepository,
};
