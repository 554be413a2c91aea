use serde::{Deserialize, Serialize};

use crate::config::LocaleConfig;
use crate::models::{GeoPoint, PlaceRecord};

use super::canvas::MapCanvas;

const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/?api=1";

/// External directions link for a coordinate.
pub fn directions_url(point: &GeoPoint) -> String {
    format!(
        "{DIRECTIONS_BASE_URL}&destination={},{}",
        point.latitude, point.longitude
    )
}

/// A pin on the map, one per geolocatable place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub name: String,
    pub position: GeoPoint,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub directions_url: String,
}

impl MapMarker {
    /// `None` for places without usable coordinates.
    pub fn from_place(place: &PlaceRecord) -> Option<Self> {
        let position = place.position()?;
        Some(Self {
            name: place.name.clone(),
            position,
            description: place.description.clone(),
            price: place.price.clone(),
            directions_url: directions_url(&position),
        })
    }
}

/// Axis-aligned viewport in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn around(point: GeoPoint) -> Self {
        Self {
            south: point.latitude,
            west: point.longitude,
            north: point.latitude,
            east: point.longitude,
        }
    }

    pub fn extend(&mut self, point: GeoPoint) {
        self.south = self.south.min(point.latitude);
        self.north = self.north.max(point.latitude);
        self.west = self.west.min(point.longitude);
        self.east = self.east.max(point.longitude);
    }

    /// Smallest bounds covering every point, `None` when there are none.
    pub fn covering(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bounds = Self::around(points.next()?);
        for point in points {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}

/// Drives a [`MapCanvas`] from a search result.
#[derive(Debug, Clone)]
pub struct MapPresenter {
    default_center: GeoPoint,
    default_zoom: u8,
}

impl MapPresenter {
    pub fn new(locale: &LocaleConfig) -> Self {
        Self {
            default_center: locale.default_center,
            default_zoom: locale.default_zoom,
        }
    }

    /// Draw `places` and the optional user position.
    ///
    /// Non-geolocatable places get no marker and never influence the
    /// viewport. The viewport is only fitted when at least one place has
    /// coordinates; the user position then widens it.
    pub fn present(
        &self,
        places: &[PlaceRecord],
        user_location: Option<GeoPoint>,
        canvas: &mut dyn MapCanvas,
    ) {
        canvas.initialize(user_location.unwrap_or(self.default_center), self.default_zoom);

        let markers: Vec<MapMarker> = places.iter().filter_map(MapMarker::from_place).collect();
        canvas.set_markers(&markers);
        canvas.set_user_marker(user_location);

        let Some(mut bounds) = Bounds::covering(markers.iter().map(|marker| marker.position))
        else {
            return;
        };
        if let Some(user) = user_location {
            bounds.extend(user);
        }
        canvas.fit_bounds(&bounds);
    }
}
