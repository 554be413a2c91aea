//! Map rendering boundary.
//!
//! The presenter decides what the map shows; a [`MapCanvas`] adapter draws it.
//! [`SceneCanvas`] records the drawing calls as a [`MapScene`] that a browser
//! map library can replay.

mod canvas;
mod presenter;

pub use canvas::{MapCanvas, MapScene, SceneCanvas, BOUNDS_PADDING_PX};
pub use presenter::{directions_url, Bounds, MapMarker, MapPresenter};
