//! # UAV Radar Simulator - Domain Model
//!
//! Core value objects and entities shared by the simulation engine and the
//! radar API: the surveillance zone, tracked UAV state, the events pushed to
//! observers, and the spherical-earth distance math the geofence relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// GEODESY
// =============================================================================

/// Mean earth radius used by every distance computation, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters spanned by one degree of latitude on the model sphere.
#[must_use]
pub fn meters_per_degree() -> f64 {
    EARTH_RADIUS_M.to_radians()
}

/// Great-circle distance between two points in meters (Haversine formula).
#[must_use]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Circular surveillance zone covered by the radar.
///
/// The zone is fixed for the lifetime of the process and is the only
/// geofence the simulation enforces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub latitude: f64,
    pub longitude: f64,
    /// Radar altitude in meters
    pub altitude: f64,
    /// Coverage radius in meters
    pub radius: f64,
}

impl Zone {
    /// Build a zone, rejecting geometry the motion model cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidZone`] if the radius is not a positive
    /// finite number or the center lies outside valid coordinate ranges.
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: f64,
        radius: f64,
    ) -> Result<Self, DomainError> {
        let zone = Self {
            latitude,
            longitude,
            altitude,
            radius,
        };
        zone.validate()?;
        Ok(zone)
    }

    /// Check the zone geometry.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidZone`] describing the first problem found.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(DomainError::InvalidZone(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        // Poles are excluded: the longitude scale 1/cos(lat) diverges there.
        if !(self.latitude > -90.0 && self.latitude < 90.0) {
            return Err(DomainError::InvalidZone(format!(
                "center latitude out of range: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DomainError::InvalidZone(format!(
                "center longitude out of range: {}",
                self.longitude
            )));
        }
        if !self.altitude.is_finite() {
            return Err(DomainError::InvalidZone("altitude must be finite".to_string()));
        }
        Ok(())
    }

    /// Distance from the zone center to a point, in meters.
    #[must_use]
    pub fn distance_from_center(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_distance_m(latitude, longitude, self.latitude, self.longitude)
    }

    /// Whether a point lies within the coverage radius.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.distance_from_center(latitude, longitude) <= self.radius
    }
}

impl Default for Zone {
    fn default() -> Self {
        // Taiyuan test range
        Self {
            latitude: 37.761_196,
            longitude: 112.531_004,
            altitude: 200.0,
            radius: 2000.0,
        }
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// A tracked UAV inside the radar zone.
///
/// Serialized in the shape observers consume: camelCase keys and a
/// millisecond epoch timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Uav {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub is_dangerous: bool,
}

impl Uav {
    /// Distance from this UAV to the zone center, in meters.
    #[must_use]
    pub fn distance_to_center(&self, zone: &Zone) -> f64 {
        zone.distance_from_center(self.latitude, self.longitude)
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Change notification pushed to every observer.
///
/// Externally tagged on the wire: `{"UavUpdate": {...}}` or
/// `{"UavRemove": "<id>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UavEvent {
    /// A UAV appeared or moved.
    #[serde(rename = "UavUpdate")]
    Updated(Uav),
    /// A UAV left the picture; carries only its identifier.
    #[serde(rename = "UavRemove")]
    Removed(Uuid),
}

impl UavEvent {
    /// Identifier of the UAV this event concerns.
    #[must_use]
    pub const fn uav_id(&self) -> Uuid {
        match self {
            Self::Updated(uav) => uav.id,
            Self::Removed(id) => *id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Updated(_) => "uav-update",
            Self::Removed(_) => "uav-remove",
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid zone: {0}")]
    InvalidZone(String),

    #[error("Duplicate UAV identifier: {0}")]
    DuplicateId(Uuid),
}
