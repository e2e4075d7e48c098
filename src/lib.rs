//! scatter-grid-rs: tiled point-cloud rendering with inverse hit-testing.
//!
//! Panels of timestamped, priced points are normalized per panel into a
//! shared render space, uploaded once per snapshot into GPU buffers, and drawn
//! as a grid of viewport/scissor-confined cells on one surface. Pointer
//! positions are mapped back through the same bounds to recover the points
//! under the cursor.

pub mod aggregation;
pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{ScatterGridConfig, ScatterGridEngine};
pub use error::{ChartError, ChartResult};
