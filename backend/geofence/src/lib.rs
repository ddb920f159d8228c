//! # Geofence
//!
//! Great-circle distance between two positions and the classroom boundary check.
//!
//! ## Haversine
//!
//! ```text
//! a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)
//! c = 2 · atan2(√a, √(1 − a))
//! d = R · c
//! ```
//!
//! - φ is latitude, λ is longitude, both in radians
//! - R is the mean Earth radius, 6371 km
//! - Accurate to roughly 0.5% since the Earth is not a perfect sphere, plenty for a classroom radius
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_CLASSROOM: Coordinates = Coordinates {
    latitude: 21.2486,
    longitude: 81.6094,
};

pub const DEFAULT_RADIUS_METERS: f64 = 10.0;

#[derive(Error, Debug, PartialEq)]
pub enum CoordinateError {
    #[error("Coordinates must be finite numbers")]
    NotFinite,

    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("Radius {0} must be a finite, non-negative number of meters")]
    InvalidRadius(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self, other)
    }

    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        haversine_km(self, other) * 1000.0
    }
}

/// Great-circle distance in kilometers.
pub fn haversine_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();

    let delta_lat = lat2 - lat1;
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Where a point sits relative to a [`Geofence`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub distance_meters: f64,
    pub inside: bool,
}

/// A circle of `radius_meters` around `center`. The boundary counts as inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub center: Coordinates,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: Coordinates, radius_meters: f64) -> Result<Self, CoordinateError> {
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(CoordinateError::InvalidRadius(radius_meters));
        }

        Ok(Self {
            center,
            radius_meters,
        })
    }

    pub fn locate(&self, point: &Coordinates) -> Fix {
        let distance_meters = self.center.distance_meters(point);

        Fix {
            distance_meters,
            inside: distance_meters <= self.radius_meters,
        }
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        self.locate(point).inside
    }
}

impl Default for Geofence {
    fn default() -> Self {
        Self {
            center: DEFAULT_CLASSROOM,
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}
