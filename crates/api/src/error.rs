//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::PlacementError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement failed.
    Placement(PlacementError),
    /// A catalog read failed; the message is what the client sees.
    Store {
        message: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    /// Wraps a store failure behind a fixed client-facing message.
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Store { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Placement(err) => placement_error_to_response(err),
            ApiError::Store { message, source } => {
                tracing::error!(error = %source, "store error");
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn placement_error_to_response(err: PlacementError) -> (StatusCode, String) {
    match &err {
        PlacementError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        PlacementError::UnknownSize { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        PlacementError::UserResolutionFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create user".to_string(),
        ),
        PlacementError::OrderPersistenceFailed(_) | PlacementError::CommitFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create order".to_string(),
        ),
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        ApiError::Placement(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn integrity_rejections_are_client_errors() {
        assert_eq!(
            status_of(ApiError::from(PlacementError::InsufficientStock {
                product_id: ProductId::new(1),
                size_token: "S".to_string(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::from(PlacementError::UnknownSize {
                size_token: "XXXL".to_string(),
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn storage_failures_are_server_errors() {
        assert_eq!(
            status_of(ApiError::from(PlacementError::CommitFailed(
                StoreError::Unavailable("commit")
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::store("Failed to fetch products")(
                StoreError::Unavailable("catalog")
            )),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_errors_keep_their_message() {
        assert_eq!(
            status_of(ApiError::NotFound("Product not found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
