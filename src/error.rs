//! Error taxonomy for the HTTP surface and the response envelopes built from it.

use actix_web::http::header::{ContentType, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Failure surfaced by a handler; each variant maps to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    /// The cause is logged, only `message` reaches the client.
    #[error("{message}")]
    Internal { message: String, cause: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>, cause: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Forbidden(message)
            | Self::Internal { message, .. } => message,
        }
    }
}

/// Body of every JSON error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Internal { message, cause } = self {
            error!("{message}: {cause}");
        }
        json_response(self.status_code(), &ErrorEnvelope::new(self.message()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Serialize `value` as a bare JSON body with the UTF-8 JSON content type.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, JSON_UTF8))
            .body(body),
        Err(e) => {
            error!("Failed to serialize response: {e}");
            HttpResponse::InternalServerError()
                .insert_header(ContentType::plaintext())
                .body("Internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    async fn envelope_of(response: HttpResponse) -> ErrorEnvelope {
        let bytes = to_bytes(response.into_body())
            .await
            .expect("response body to bytes");
        serde_json::from_slice(&bytes).expect("envelope deserializes")
    }

    #[rstest]
    #[case(ApiError::validation("Chirp is too long"), StatusCode::BAD_REQUEST)]
    #[case(ApiError::not_found("Chirp not found"), StatusCode::NOT_FOUND)]
    #[case(ApiError::conflict("Email already exists"), StatusCode::CONFLICT)]
    #[case(ApiError::forbidden("nope"), StatusCode::FORBIDDEN)]
    #[case(
        ApiError::internal("Could not create chirp", "connection reset"),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[actix_web::test]
    async fn maps_variants_to_status_and_envelope(
        #[case] error: ApiError,
        #[case] expected: StatusCode,
    ) {
        let message = error.message().to_string();
        let response = error.error_response();

        assert_eq!(response.status(), expected);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(JSON_UTF8.as_bytes())
        );
        let envelope = envelope_of(response).await;
        assert_eq!(envelope, ErrorEnvelope::new(message));
    }

    #[actix_web::test]
    async fn internal_cause_is_not_exposed() {
        let response = ApiError::internal("Could not create user", "secret dsn").error_response();
        let bytes = to_bytes(response.into_body()).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8");
        assert!(!text.contains("secret dsn"));
        assert!(text.contains("Could not create user"));
    }

    #[actix_web::test]
    async fn quotes_in_messages_stay_valid_json() {
        let response = ApiError::validation(r#"bad "quoted" input"#).error_response();
        let envelope = envelope_of(response).await;
        assert_eq!(envelope.status, "error");
        assert_eq!(envelope.message, r#"bad "quoted" input"#);
    }
}
