pub mod dish_service;

pub use dish_service::{DishService, ListDishesParams, ServiceError};
