//! Mapping from service failures to HTTP responses.

use crate::app::ServiceError;
use crate::storage::RepositoryError;
use crate::transport::http::types::ErrorResponse;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Malformed or out-of-range input.
    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    /// Details are logged, never sent to the client.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ServiceError::AlreadyExists(_) => ApiError::Conflict(err.to_string()),
            ServiceError::Validation(msg) => ApiError::Unprocessable(msg),
            ServiceError::Repository(RepositoryError::UnsupportedSortField(e)) => {
                ApiError::Unprocessable(e.to_string())
            }
            ServiceError::Repository(RepositoryError::Conflict { name }) => {
                ApiError::Conflict(format!("Dish with name '{}' already exists.", name))
            }
            ServiceError::Repository(RepositoryError::Database(e)) => {
                tracing::error!(error = ?e, "unhandled storage error");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::Unprocessable(format!("Invalid JSON body: {}", err.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::Unprocessable(format!("Invalid query string: {}", err.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::Unprocessable(format!("Invalid path parameter: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::UnsupportedSortField;

    #[test]
    fn service_errors_map_to_documented_statuses() {
        let cases = [
            (ServiceError::NotFound(1), StatusCode::NOT_FOUND),
            (
                ServiceError::AlreadyExists("Pizza".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Validation("name must not be empty".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Repository(RepositoryError::UnsupportedSortField(
                    UnsupportedSortField("price".to_string()),
                )),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Repository(RepositoryError::Conflict {
                    name: "Pizza".to_string(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Repository(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::from(ServiceError::Repository(RepositoryError::Database(
            sqlx::Error::Protocol("password authentication failed".to_string()),
        )));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn not_found_detail_names_the_id() {
        let err = ApiError::from(ServiceError::NotFound(42));
        assert_eq!(err.to_string(), "Dish with ID '42' not found.");
    }
}
