//! Geographic primitives.
//!
//! # Responsibility
//! - Provide validated WGS84 point and rectangle types.
//! - Own great-circle distance computation used by radius queries.
//!
//! # Invariants
//! - `longitude` is always within [-180, 180], `latitude` within [-90, 90].
//! - A `GeoBounds` upper-left corner is always north-west of (or equal to)
//!   its lower-right corner.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Validation error for geographic inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoValidationError {
    /// Longitude outside [-180, 180] or not finite.
    LongitudeOutOfRange(f64),
    /// Latitude outside [-90, 90] or not finite.
    LatitudeOutOfRange(f64),
    /// Upper-left corner is not north-west of the lower-right corner.
    MalformedBounds {
        upper_left: (f64, f64),
        lower_right: (f64, f64),
    },
}

impl Display for GeoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} must be within [-180, 180]")
            }
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} must be within [-90, 90]")
            }
            Self::MalformedBounds {
                upper_left,
                lower_right,
            } => write!(
                f,
                "bounds corner ({}, {}) is not north-west of ({}, {})",
                upper_left.0, upper_left.1, lower_right.0, lower_right.1
            ),
        }
    }
}

impl Error for GeoValidationError {}

/// Validated WGS84 point, stored as (longitude, latitude) degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    longitude: f64,
    latitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoValidationError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.longitude, raw.latitude)
    }
}

impl GeoPoint {
    /// Creates a point after range-checking both coordinates.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoValidationError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoValidationError::LongitudeOutOfRange(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoValidationError::LatitudeOutOfRange(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Great-circle distance to another point in meters (haversine).
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}

/// Validated rectangular area given as (upper-left, lower-right) corners.
///
/// Containment is inclusive on all four edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoBounds")]
pub struct GeoBounds {
    upper_left: GeoPoint,
    lower_right: GeoPoint,
}

#[derive(Deserialize)]
struct RawGeoBounds {
    upper_left: GeoPoint,
    lower_right: GeoPoint,
}

impl TryFrom<RawGeoBounds> for GeoBounds {
    type Error = GeoValidationError;

    fn try_from(raw: RawGeoBounds) -> Result<Self, Self::Error> {
        Self::new(raw.upper_left, raw.lower_right)
    }
}

impl GeoBounds {
    /// Creates bounds, rejecting corners where the upper-left is not
    /// north-west of the lower-right.
    pub fn new(upper_left: GeoPoint, lower_right: GeoPoint) -> Result<Self, GeoValidationError> {
        if upper_left.longitude() > lower_right.longitude()
            || upper_left.latitude() < lower_right.latitude()
        {
            return Err(GeoValidationError::MalformedBounds {
                upper_left: (upper_left.longitude(), upper_left.latitude()),
                lower_right: (lower_right.longitude(), lower_right.latitude()),
            });
        }
        Ok(Self {
            upper_left,
            lower_right,
        })
    }

    pub fn upper_left(&self) -> GeoPoint {
        self.upper_left
    }

    pub fn lower_right(&self) -> GeoPoint {
        self.lower_right
    }

    /// Returns whether the point lies inside the rectangle, edges included.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.longitude() >= self.upper_left.longitude()
            && point.longitude() <= self.lower_right.longitude()
            && point.latitude() <= self.upper_left.latitude()
            && point.latitude() >= self.lower_right.latitude()
    }
}
