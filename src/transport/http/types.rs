use crate::app::{DishService, ListDishesParams};
use crate::domain::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::transport::http::error::ApiError;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub dishes: DishService,
}

impl AppState {
    pub fn new(dishes: DishService) -> Self {
        Self { dishes }
    }
}

/// Body of every error response.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDishesQuery {
    /// Case-insensitive substring of the dish name.
    pub search: Option<String>,
    /// One of `id`, `name`, `created_at`, `updated_at` (default `id`).
    pub order_by: Option<String>,
    /// `asc` or `desc` (default `asc`).
    pub direction: Option<String>,
    /// Page size, 1-100 (default 10).
    pub limit: Option<i64>,
    /// Rows to skip, >= 0 (default 0).
    pub offset: Option<i64>,
}

impl ListDishesQuery {
    /// Applies defaults and rejects out-of-range pagination.
    pub fn into_list_params(self) -> Result<ListDishesParams, ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ApiError::Unprocessable(format!(
                "limit must be between 1 and {} (got {})",
                MAX_PAGE_SIZE, limit
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::Unprocessable(format!(
                "offset must be >= 0 (got {})",
                offset
            )));
        }

        let defaults = ListDishesParams::default();
        Ok(ListDishesParams {
            search: self.search,
            order_by: self.order_by.unwrap_or(defaults.order_by),
            direction: self.direction.unwrap_or(defaults.direction),
            limit,
            offset,
        })
    }
}
