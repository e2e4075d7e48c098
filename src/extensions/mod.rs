//! Optional overlays layered on top of the point cloud.
//!
//! Keep extensions out of the normalization and GPU paths: they consume
//! prepared panels and emit caller-drawn primitives.

pub mod markers;

pub use markers::{MarkerOverlayStyle, PanelMarker, append_marker_crosshairs};
