use actix_web::{error::JsonPayloadError, http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::{migrate::MigrateError, Error as SqlxError};
use std::env::VarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Migration error: {0}")]
    MigrationError(#[from] MigrateError),

    #[error("User not found")]
    UserNotFound,

    #[error("Test not found")]
    TestNotFound,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] VarError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound | AppError::TestNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::InvalidConfig(_)
            | AppError::EnvVarError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}

impl From<JsonPayloadError> for AppError {
    fn from(err: JsonPayloadError) -> Self {
        AppError::InvalidBody(err.to_string())
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
