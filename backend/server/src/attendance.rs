//! # Attendance
//!
//! Rules applied when a student marks attendance, after the open flag and roster
//! lookup have passed.
//!
//! 1. The position must be inside the classroom geofence, otherwise nothing is saved
//! 2. With the daily guard on, a roll number may only be accepted once per calendar day
//! 3. First mark creates the record with a count of 1
//! 4. Repeat marks increment the count
//! 5. Every accepted mark overwrites the last position, distance and date
use chrono::NaiveDate;
use geofence::{Coordinates, Geofence};

use crate::{error::AppError, models::AttendanceRecord};

#[derive(Debug, Clone, Copy)]
pub struct MarkPolicy {
    pub geofence: Geofence,
    pub once_per_day: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    First,
    Repeat,
}

pub fn mark(
    policy: &MarkPolicy,
    existing: Option<AttendanceRecord>,
    roll_number: &str,
    position: Coordinates,
    today: NaiveDate,
) -> Result<(AttendanceRecord, MarkKind), AppError> {
    let fix = policy.geofence.locate(&position);

    if !fix.inside {
        return Err(AppError::OutOfRange {
            distance_meters: fix.distance_meters,
        });
    }

    let (attendance_count, kind) = match existing {
        Some(record) if policy.once_per_day && record.last_marked == Some(today) => {
            return Err(AppError::AlreadyMarked);
        }
        Some(record) => (record.attendance_count.saturating_add(1), MarkKind::Repeat),
        None => (1, MarkKind::First),
    };

    let record = AttendanceRecord {
        roll_number: roll_number.to_string(),
        latitude: position.latitude,
        longitude: position.longitude,
        distance: fix.distance_meters,
        attendance_count,
        last_marked: Some(today),
    };

    Ok((record, kind))
}
