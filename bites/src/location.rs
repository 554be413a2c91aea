//! Geolocation boundary.
//!
//! Location is always optional: a failed lookup degrades to "no hint" plus an
//! advisory for the user, and never blocks a search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BitesError, Result};
use crate::models::GeoPoint;

pub const LOCATION_DENIED_ADVISORY: &str =
    "Location access denied. 'Nearest' search may be less accurate.";

/// One-shot source of the device position.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current(&self) -> Result<GeoPoint>;
}

/// What the browser reported for the geolocation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportedLocation {
    Granted { latitude: f64, longitude: f64 },
    Denied,
    Unavailable,
}

#[async_trait]
impl LocationSource for ReportedLocation {
    async fn current(&self) -> Result<GeoPoint> {
        match *self {
            ReportedLocation::Granted {
                latitude,
                longitude,
            } => GeoPoint::checked(latitude, longitude).ok_or_else(|| {
                BitesError::Geolocation(format!(
                    "Reported coordinates out of range: {latitude}, {longitude}"
                ))
            }),
            ReportedLocation::Denied => {
                Err(BitesError::Geolocation("Permission denied".to_string()))
            }
            ReportedLocation::Unavailable => {
                Err(BitesError::Geolocation("Position unavailable".to_string()))
            }
        }
    }
}

/// Outcome of a location lookup. `advisory` is set whenever `point` is not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct LocationResolution {
    pub point: Option<GeoPoint>,
    pub advisory: Option<String>,
}

pub async fn resolve_location(source: &dyn LocationSource) -> LocationResolution {
    match source.current().await {
        Ok(point) => LocationResolution {
            point: Some(point),
            advisory: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Geolocation failed, searching without a location hint");
            LocationResolution {
                point: None,
                advisory: Some(LOCATION_DENIED_ADVISORY.to_string()),
            }
        }
    }
}
