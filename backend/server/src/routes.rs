use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use geofence::Coordinates;
use tracing::{info, warn};

use crate::{
    attendance::{MarkKind, mark},
    error::AppError,
    models::{
        AuthenticateRequest, MarkAttendanceRequest, MarkAttendanceResponse, MessageResponse,
        ResultsResponse, StatusResponse,
    },
    state::AppState,
    utils::{sanitize_roll_number, today, verify_password},
};

pub async fn results_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResultsResponse>, AppError> {
    let results = state.database.results().await?;

    Ok(Json(ResultsResponse {
        success: true,
        results,
    }))
}

pub async fn authenticate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::MalformedPayload(e.body_text()))?;

    let matches = state
        .database
        .credential()
        .await?
        .is_some_and(|credential| verify_password(&payload.password, &credential.password_digest));

    if !matches {
        warn!("Rejected teacher authentication attempt");
        return Err(AppError::InvalidCredentials);
    }

    state.database.set_accessible(true).await?;
    info!("Teacher authenticated, attendance open");

    Ok(Json(MessageResponse::success(
        "Teacher authenticated successfully.",
    )))
}

pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(StatusResponse {
        success: state.database.accessible().await?,
    }))
}

pub async fn mark_attendance_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MarkAttendanceRequest>, JsonRejection>,
) -> Result<Json<MarkAttendanceResponse>, AppError> {
    if !state.database.accessible().await? {
        return Err(AppError::AttendanceClosed);
    }

    let Json(payload) = payload.map_err(|e| AppError::MalformedPayload(e.body_text()))?;

    let roll_number = sanitize_roll_number(&payload.roll_number)
        .ok_or_else(|| AppError::MalformedPayload("rollNumber must not be empty".to_string()))?;
    let position = Coordinates::new(payload.latitude, payload.longitude)?;

    if !state.database.user_exists(&roll_number).await? {
        return Err(AppError::UserNotFound);
    }

    let existing = state.database.result(&roll_number).await?;

    let (record, kind) = mark(&state.policy, existing, &roll_number, position, today())
        .inspect_err(|e| {
            if let AppError::OutOfRange { distance_meters } = e {
                info!("{roll_number} out of range at {distance_meters:.1}m");
            }
        })?;

    state.database.save_result(&record).await?;

    match kind {
        MarkKind::First => info!("{roll_number} marked for the first time"),
        MarkKind::Repeat => info!(
            "{roll_number} marked, count now {}",
            record.attendance_count
        ),
    }

    Ok(Json(MarkAttendanceResponse {
        success: true,
        message: "Attendance marked successfully.".to_string(),
        distance: record.distance,
        attendance_count: record.attendance_count,
    }))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, AppError> {
    state.database.set_accessible(false).await?;
    info!("Teacher logged out, attendance closed");

    Ok(Json(MessageResponse::success(
        "Teacher logged out successfully.",
    )))
}
