use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Builds a point only when both values are finite and inside the
    /// geographic range (latitude in [-90, 90], longitude in [-180, 180]).
    pub fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// A venue discovered by a place search.
///
/// Coordinates are kept exactly as coerced from the backend payload. A record
/// whose coordinates are missing or out of range is still listed, but
/// `geolocatable` is false and it never reaches the map. Records are
/// built with [`PlaceRecord::new`], which derives the flag from the
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub geolocatable: bool,
}

impl PlaceRecord {
    pub fn new(
        name: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        description: impl Into<String>,
        price: Option<String>,
    ) -> Self {
        let geolocatable = match (latitude, longitude) {
            (Some(lat), Some(lng)) => GeoPoint::checked(lat, lng).is_some(),
            _ => false,
        };

        Self {
            name: name.into(),
            latitude,
            longitude,
            description: description.into(),
            price,
            geolocatable,
        }
    }

    /// The record's position, if it can be placed on a map.
    pub fn position(&self) -> Option<GeoPoint> {
        if !self.geolocatable {
            return None;
        }
        GeoPoint::checked(self.latitude?, self.longitude?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_rejects_out_of_range() {
        assert!(GeoPoint::checked(91.0, 0.0).is_none());
        assert!(GeoPoint::checked(0.0, -180.5).is_none());
        assert!(GeoPoint::checked(f64::NAN, 0.0).is_none());
        assert!(GeoPoint::checked(-90.0, 180.0).is_some());
    }

    #[test]
    fn record_without_coordinates_is_not_geolocatable() {
        let place = PlaceRecord::new("Gwangjang Market", None, Some(127.0), "", None);
        assert!(!place.geolocatable);
        assert!(place.position().is_none());
    }

    #[test]
    fn record_serializes_camel_case_and_omits_missing_price() {
        let place = PlaceRecord::new("A", Some(37.5), Some(127.0), "x", None);
        let json = serde_json::to_value(&place).expect("serialize");
        assert_eq!(json["name"], "A");
        assert_eq!(json["geolocatable"], true);
        assert!(json.get("price").is_none());
    }

    #[test]
    fn position_rechecks_range_even_when_flagged() {
        let place = PlaceRecord {
            geolocatable: true,
            ..PlaceRecord::new("Namsan Tower Cafe", Some(137.5), Some(127.0), "", None)
        };
        assert!(place.position().is_none());
    }
}
