use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use geofence::{Coordinates, Geofence};
use tracing::{info, warn};

use crate::{attendance::MarkPolicy, error::ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Redis,
    Memory,
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(DatabaseKind::Redis),
            "memory" => Ok(DatabaseKind::Memory),
            other => Err(format!("unknown database {other:?}, expected redis or memory")),
        }
    }
}

pub struct Config {
    pub port: u16,
    pub database: DatabaseKind,
    pub redis_url: String,
    pub policy: MarkPolicy,
    pub teacher_password: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let classroom = Coordinates::new(
            try_load("CLASSROOM_LATITUDE", "21.2486")?,
            try_load("CLASSROOM_LONGITUDE", "81.6094")?,
        )?;
        let geofence = Geofence::new(classroom, try_load("ATTENDANCE_RADIUS_METERS", "10")?)?;

        Ok(Self {
            port: try_load("RUST_PORT", "5000")?,
            database: try_load("DATABASE", "redis")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            policy: MarkPolicy {
                geofence,
                once_per_day: try_load("ATTENDANCE_ONCE_PER_DAY", "true")?,
            },
            teacher_password: var("TEACHER_PASSWORD").or_else(|| read_secret("TEACHER_PASSWORD")),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse_value(key, var(key), default)
}

fn parse_value<T: FromStr>(key: &str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");

            ConfigError::InvalidVar {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("{secret_name} secret not readable at {path}: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_used_when_unset() {
        let port: u16 = parse_value("RUST_PORT", None, "5000").unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_value_overrides_default() {
        let radius: f64 = parse_value("ATTENDANCE_RADIUS_METERS", Some(" 3 ".to_string()), "10").unwrap();
        assert_eq!(radius, 3.0);
    }

    #[test]
    fn test_invalid_value_is_error() {
        let result: Result<bool, _> =
            parse_value("ATTENDANCE_ONCE_PER_DAY", Some("sometimes".to_string()), "true");

        match result {
            Err(ConfigError::InvalidVar { key, .. }) => assert_eq!(key, "ATTENDANCE_ONCE_PER_DAY"),
            _ => panic!("expected InvalidVar"),
        }
    }

    #[test]
    fn test_database_kind() {
        assert_eq!("Redis".parse::<DatabaseKind>(), Ok(DatabaseKind::Redis));
        assert_eq!(" memory".parse::<DatabaseKind>(), Ok(DatabaseKind::Memory));
        assert!("mongo".parse::<DatabaseKind>().is_err());
    }
}
