//! Request-level error taxonomy and its HTTP mapping.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grid_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no file uploaded")]
    NoFile,

    #[error("unexpected field: {0}")]
    UnexpectedField(String),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("error generating filename")]
    RandomnessFailure(#[source] getrandom::Error),

    /// Body is the store's own message, unchanged.
    #[error(transparent)]
    StoreWrite(StoreError),

    #[error("file not found")]
    NotFound,

    #[error("origin not allowed by CORS: {0}")]
    CorsRejection(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoFile | GatewayError::UnexpectedField(_) => StatusCode::BAD_REQUEST,
            GatewayError::Multipart(e) => e.status(),
            GatewayError::RandomnessFailure(_) | GatewayError::StoreWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::CorsRejection(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = match &self {
            GatewayError::Multipart(e) => e.body_text(),
            GatewayError::CorsRejection(_) => "origin not allowed by CORS".to_string(),
            other => other.to_string(),
        };
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(GatewayError::NoFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            GatewayError::CorsRejection("https://evil.example".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::StoreWrite(StoreError::Write("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_write_message_passes_through() {
        let err = GatewayError::StoreWrite(StoreError::Write("E11000 duplicate key".into()));
        assert_eq!(err.to_string(), "E11000 duplicate key");
    }
}
