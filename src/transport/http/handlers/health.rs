use crate::transport::http::error::ApiError;
use crate::transport::http::types::AppState;
use axum::extract::State;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is alive", body = String, content_type = "text/plain")
    )
)]
pub async fn healthcheck_handler() -> impl IntoResponse {
    "OK"
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Storage reachable", body = String, content_type = "text/plain"),
        (status = 503, description = "Storage unreachable", body = ErrorResponse)
    )
)]
pub async fn readiness_handler(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    match state.dishes.repository().ping().await {
        Ok(()) => Ok("OK"),
        Err(e) => {
            tracing::error!(error = ?e, "storage ping failed");
            Err(ApiError::ServiceUnavailable(
                "Storage is unreachable".to_string(),
            ))
        }
    }
}
