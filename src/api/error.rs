//! Error to HTTP response mapping.

use crate::Error;
use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error returned by every handler.
///
/// | Source | Status | Body |
/// |--------|--------|------|
/// | `Error::Validation` | 400 | `{"message": "Validation error", "errors": {...}}` |
/// | `Error::NotFound` | 404 | `{"message": "Company not found"}` |
/// | `Error::Parse` | 400 | `{"message": "Invalid CSV file: ..."}` |
/// | `Error::InvalidInput` | 400 | `{"message": <input message>}` |
/// | `Error::OperationFailed` | 500 | `{"message": "Internal server error"}` |
/// | request extraction | rejection status | `{"message": ...}` |
#[derive(Debug)]
pub enum ApiError {
    /// A registry error.
    Registry(Error),
    /// The request could not be extracted.
    Request {
        /// Response status.
        status: StatusCode,
        /// Client-facing message.
        message: String,
    },
}

impl ApiError {
    /// Creates a 400 error with a message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Request {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Registry(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Multipart extraction rejected");
        Self::bad_request(super::transfer::NO_FILE_PART)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Request {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Request { status, message } => (status, json!({ "message": message })),
            Self::Registry(Error::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Validation error", "errors": errors }),
            ),
            Self::Registry(Error::NotFound { entity, .. }) => (
                StatusCode::NOT_FOUND,
                json!({ "message": format!("{} not found", capitalize(entity)) }),
            ),
            Self::Registry(Error::Parse { format, message }) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": format!("Invalid {format} file: {message}") }),
            ),
            Self::Registry(Error::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            },
            Self::Registry(err @ Error::OperationFailed { .. }) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            },
        };
        (status, Json(body)).into_response()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompanyId;
    use crate::validation::ValidationErrors;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = render(Error::company_not_found(&CompanyId::new("x")).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Company not found"}));
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut errors = ValidationErrors::single("name", "Name cannot be empty.");
        errors.add("email", "Email must be a valid email address.");
        let (status, body) = render(Error::Validation(errors).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"]["name"][0], "Name cannot be empty.");
        assert!(body["errors"]["email"].is_array());
    }

    #[tokio::test]
    async fn test_parse_error_message() {
        let err = Error::Parse {
            format: "CSV",
            message: "bad record".to_string(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid CSV file: bad record");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let err = Error::OperationFailed {
            operation: "insert_company".to_string(),
            cause: "disk I/O error".to_string(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"message": "Internal server error"}));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("company"), "Company");
        assert_eq!(capitalize(""), "");
    }
}
