use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::ErrorResponse;
use crate::services::{IdentityError, StoreError};

/// Error returned by every route handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Unauthorized(_) | ApiError::Identity(IdentityError::Rejected(_)) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound(_)) => "not_found",
            ApiError::TooManyRequests(_) => "daily_limit_reached",
            ApiError::Store(_) => "internal_error",
            ApiError::Identity(_) => "identity_provider_error",
        }
    }

    /// Message shown to clients; internal details stay in the log
    fn public_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::NotFound(what)) => format!("Not found: {}", what),
            ApiError::Store(_) => "Internal server error".to_string(),
            ApiError::Identity(IdentityError::Rejected(message)) => message.clone(),
            ApiError::Identity(_) => "Identity provider unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Identity(IdentityError::Rejected(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Identity(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.public_message(),
            status_code: status.as_u16(),
        })
    }
}

/// Malformed JSON bodies answer with the JSON error shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req: &HttpRequest| {
        tracing::info!("JSON payload error on {}: {}", req.path(), err);
        ApiError::BadRequest(format!("Invalid JSON: {}", err)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        ApiError::BadRequest(format!("Invalid query: {}", err)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = ApiError::TooManyRequests("Daily swipe limit reached".into()).error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.status_code, 429);
        assert_eq!(parsed.message, "Daily swipe limit reached");
    }

    #[test]
    fn test_store_details_are_hidden() {
        let err = ApiError::Store(StoreError::InvalidRecord("profile x has age 300".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");

        let missing = ApiError::Store(StoreError::NotFound("post p1".into()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_rejected_credentials_are_unauthorized() {
        let err = ApiError::Identity(IdentityError::Rejected("Invalid login credentials".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), "Invalid login credentials");
    }
}
