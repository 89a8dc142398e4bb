pub mod memory;
pub mod postgres;
pub mod repository;
pub mod sqlite;

pub use memory::InMemoryDishRepository;
pub use postgres::PgDishRepository;
pub use repository::{DishRepository, RepositoryError};
pub use sqlite::SqliteDishRepository;
