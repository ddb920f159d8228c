use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use geofence::CoordinateError;
use thiserror::Error;
use tracing::error;

use crate::models::MessageResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid credentials. Only teachers are allowed to authenticate.")]
    InvalidCredentials,

    #[error("Attendance is not open.")]
    AttendanceClosed,

    #[error("User not found.")]
    UserNotFound,

    #[error("You are not within the attendance range.")]
    OutOfRange { distance_meters: f64 },

    #[error("Attendance already marked for today.")]
    AlreadyMarked,

    #[error("Internal error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    InvalidVar { key: String, message: String },

    #[error("Invalid classroom geofence: {0}")]
    Geofence(#[from] CoordinateError),
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::MalformedPayload(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::AttendanceClosed
            | AppError::OutOfRange { .. }
            | AppError::AlreadyMarked => StatusCode::FORBIDDEN,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Database(e) => {
                error!("Request failed: {e}");
                "Internal server error.".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(MessageResponse::failure(message))).into_response()
    }
}
