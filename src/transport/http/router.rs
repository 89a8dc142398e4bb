use crate::domain::{Dish, DishPatch, NewDish, SortDirection, SortField};
use crate::transport::http::handlers::{dishes, health};
use crate::transport::http::types::{AppState, ErrorResponse};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        health::readiness_handler,
        dishes::create_dish_handler,
        dishes::get_dish_handler,
        dishes::list_dishes_handler,
        dishes::update_dish_handler,
        dishes::delete_dish_handler
    ),
    components(schemas(Dish, NewDish, DishPatch, ErrorResponse, SortField, SortDirection))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let collection = get(dishes::list_dishes_handler).post(dishes::create_dish_handler);

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/health/ready", get(health::readiness_handler))
        .route("/dishes", collection.clone())
        .route("/dishes/", collection)
        .route(
            "/dishes/:dish_id",
            get(dishes::get_dish_handler)
                .patch(dishes::update_dish_handler)
                .delete(dishes::delete_dish_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
