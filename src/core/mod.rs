pub mod layout;
pub mod normalizer;
pub mod primitives;
pub mod scale;
pub mod types;

pub use layout::{CellHit, CellRect, GridLayout, GridLayoutConfig};
pub use normalizer::{
    NormalizerConfig, PanelBounds, PointSizeRange, PreparedPanel, PreparedPanelCache,
    RENDER_EXTENT, RENDER_MARGIN, prepare_panel, render_to_clip, render_to_unit, unit_to_render,
};
pub use scale::AxisRange;
pub use types::{Panel, Point, Rgb, TradeSide};
