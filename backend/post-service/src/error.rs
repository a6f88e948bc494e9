/// Error types for post-service
///
/// Entity-resolution failures carry the offending field so clients can map them
/// back onto a form. Visibility decisions never produce errors; an invisible post
/// is reported as `NotFound` so its existence does not leak.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    NotFound {
        field: &'static str,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::NotFound {
            field,
            message: message.into(),
        }
    }

    pub fn user_not_found() -> Self {
        Self::not_found("base", "User not found!")
    }

    /// Missing posts and posts the viewer may not see share this error.
    pub fn post_not_found() -> Self {
        Self::not_found("post", "Post not found!")
    }

    fn property(&self) -> &'static str {
        match self {
            ServiceError::NotFound { field, .. } => *field,
            _ => "base",
        }
    }
}

#[derive(Debug, Serialize)]
struct PropertyError {
    property: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    errors: Vec<PropertyError>,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorBody {
            status: status.as_u16(),
            errors: vec![PropertyError {
                property: self.property(),
                message,
            }],
        })
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn not_found_renders_property_and_message() {
        let err = ServiceError::not_found("user", "User not found!");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["errors"][0]["property"], "user");
        assert_eq!(json["errors"][0]["message"], "User not found!");
    }

    #[actix_web::test]
    async fn internal_errors_do_not_leak_details() {
        let err = ServiceError::from(anyhow::anyhow!("connection refused on 10.0.0.3"));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 500);
        assert_eq!(json["errors"][0]["message"], "Internal server error");
    }

    #[actix_web::test]
    async fn post_not_found_renders_post_property() {
        let err = ServiceError::post_not_found();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": 404,
                "errors": [{ "property": "post", "message": "Post not found!" }]
            })
        );
    }
}
