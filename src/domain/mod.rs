//! Domain types for dish records: the entity itself, its write payloads and
//! the listing query.

pub mod dish;
pub mod listing;

pub use dish::{Dish, DishPatch, NewDish, DESCRIPTION_MAX_LEN, NAME_MAX_LEN};
pub use listing::{DishListQuery, SortDirection, SortField, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
