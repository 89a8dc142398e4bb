use crate::domain::{Dish, DishPatch, NewDish};
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{AppState, ListDishesQuery};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/dishes/",
    request_body = NewDish,
    responses(
        (status = 201, description = "Dish created", body = Dish),
        (status = 409, description = "A dish with this name already exists", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_dish_handler(
    State(state): State<AppState>,
    request: Result<Json<NewDish>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_dish) = request?;
    let dish = state.dishes.create(new_dish).await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

#[utoipa::path(
    get,
    path = "/dishes/{dish_id}",
    params(
        ("dish_id" = i64, Path, description = "Dish ID")
    ),
    responses(
        (status = 200, description = "The dish", body = Dish),
        (status = 404, description = "No dish with this ID", body = ErrorResponse),
        (status = 422, description = "Invalid dish ID", body = ErrorResponse)
    )
)]
pub async fn get_dish_handler(
    State(state): State<AppState>,
    dish_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Dish>, ApiError> {
    let Path(dish_id) = dish_id?;
    tracing::debug!(dish_id, "fetching dish");
    let dish = state.dishes.get_by_id(dish_id).await?;
    Ok(Json(dish))
}

#[utoipa::path(
    get,
    path = "/dishes/",
    params(ListDishesQuery),
    responses(
        (status = 200, description = "Matching dishes", body = Vec<Dish>),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn list_dishes_handler(
    State(state): State<AppState>,
    query: Result<Query<ListDishesQuery>, QueryRejection>,
) -> Result<Json<Vec<Dish>>, ApiError> {
    let Query(query) = query?;
    let params = query.into_list_params()?;
    tracing::debug!(?params, "listing dishes");
    let dishes = state.dishes.list(params).await?;
    Ok(Json(dishes))
}

#[utoipa::path(
    patch,
    path = "/dishes/{dish_id}",
    params(
        ("dish_id" = i64, Path, description = "Dish ID")
    ),
    request_body = DishPatch,
    responses(
        (status = 200, description = "Updated dish", body = Dish),
        (status = 404, description = "No dish with this ID", body = ErrorResponse),
        (status = 409, description = "A dish with the new name already exists", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse)
    )
)]
pub async fn update_dish_handler(
    State(state): State<AppState>,
    dish_id: Result<Path<i64>, PathRejection>,
    request: Result<Json<DishPatch>, JsonRejection>,
) -> Result<Json<Dish>, ApiError> {
    let Path(dish_id) = dish_id?;
    let Json(patch) = request?;
    let dish = state.dishes.update(dish_id, patch).await?;
    Ok(Json(dish))
}

#[utoipa::path(
    delete,
    path = "/dishes/{dish_id}",
    params(
        ("dish_id" = i64, Path, description = "Dish ID")
    ),
    responses(
        (status = 204, description = "Dish deleted"),
        (status = 404, description = "No dish with this ID", body = ErrorResponse)
    )
)]
pub async fn delete_dish_handler(
    State(state): State<AppState>,
    dish_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(dish_id) = dish_id?;
    state.dishes.delete(dish_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
