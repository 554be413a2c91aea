use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

use super::presenter::{Bounds, MapMarker};

/// Padding applied around fitted bounds.
pub const BOUNDS_PADDING_PX: u32 = 50;

/// Capability interface over a concrete map library.
pub trait MapCanvas {
    fn initialize(&mut self, center: GeoPoint, zoom: u8);

    /// Replace all place markers.
    fn set_markers(&mut self, markers: &[MapMarker]);

    /// Show, move or remove the "you are here" marker.
    fn set_user_marker(&mut self, point: Option<GeoPoint>);

    fn fit_bounds(&mut self, bounds: &Bounds);
}

/// Everything a browser map needs to draw one search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub center: GeoPoint,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
    pub user_marker: Option<GeoPoint>,
    pub bounds: Option<Bounds>,
    pub padding: u32,
}

/// [`MapCanvas`] that records the calls into a [`MapScene`].
#[derive(Debug, Clone, Default)]
pub struct SceneCanvas {
    center: Option<GeoPoint>,
    zoom: u8,
    markers: Vec<MapMarker>,
    user_marker: Option<GeoPoint>,
    bounds: Option<Bounds>,
}

impl SceneCanvas {
    pub fn into_scene(self) -> MapScene {
        MapScene {
            center: self.center.unwrap_or(GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            }),
            zoom: self.zoom,
            markers: self.markers,
            user_marker: self.user_marker,
            bounds: self.bounds,
            padding: BOUNDS_PADDING_PX,
        }
    }
}

impl MapCanvas for SceneCanvas {
    fn initialize(&mut self, center: GeoPoint, zoom: u8) {
        self.center = Some(center);
        self.zoom = zoom;
    }

    fn set_markers(&mut self, markers: &[MapMarker]) {
        self.markers = markers.to_vec();
    }

    fn set_user_marker(&mut self, point: Option<GeoPoint>) {
        self.user_marker = point;
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.bounds = Some(*bounds);
    }
}
