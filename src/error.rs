use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Failure talking to the relational store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Request to table '{table}' failed: {source}")]
    Transport {
        table: String,
        source: reqwest::Error,
    },

    #[error("Store returned {status} for table '{table}': {body}")]
    Status {
        table: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode rows from table '{table}': {source}")]
    Decode {
        table: String,
        source: reqwest::Error,
    },
}

impl StoreError {
    /// HTTP status returned by the store, if the request got that far.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by the HTTP API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(e) if e.status() == Some(reqwest::StatusCode::CONFLICT) => {
                StatusCode::CONFLICT
            }
            ApiError::Store(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
