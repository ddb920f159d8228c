//! Stored records and wire payloads.
//!
//! Field names are camelCase on the wire and in the store.
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};

/// Per-student attendance record, one per roll number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub roll_number: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters from the classroom at the last accepted mark.
    pub distance: f64,
    pub attendance_count: u32,
    pub last_marked: Option<NaiveDate>,
}

/// The shared teacher credential. `allowed` is the attendance open flag.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherCredential {
    pub password_digest: String,
    pub allowed: bool,
}

#[derive(Deserialize)]
pub struct AuthenticateRequest {
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub roll_number: String,
    #[serde(deserialize_with = "number_or_string")]
    pub latitude: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub success: bool,
    pub results: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceResponse {
    pub success: bool,
    pub message: String,
    pub distance: f64,
    pub attendance_count: u32,
}

// browsers tend to send geolocation readings as strings
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid coordinate {s:?}"))),
    }
}
