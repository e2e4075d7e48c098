//! Per-panel coordinate normalization.
//!
//! A panel's points are mapped data space → unit square → render space
//! (`[RENDER_MARGIN, RENDER_MARGIN + RENDER_EXTENT]`) → clip space (`[-1, 1]`).
//! Render space is y-up: larger prices get larger render `y`. Pixel helpers
//! flip `y` for the screen's top-down convention, and hit-testing inverts the
//! exact same [`PanelBounds`] used here.

use std::sync::Arc;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::scale::AxisRange;
use crate::core::types::{Panel, Rgb};
use crate::error::{ChartError, ChartResult};

/// Margin reserved on every side of a panel for labels, in render units.
pub const RENDER_MARGIN: f64 = 0.15;
/// Extent of the plotted sub-square, in render units.
pub const RENDER_EXTENT: f64 = 0.70;

pub const POSITION_COMPONENTS: usize = 2;
pub const SIZE_COMPONENTS: usize = 1;
pub const COLOR_COMPONENTS: usize = 3;

/// Visual point diameter range, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSizeRange {
    pub min: f64,
    pub max: f64,
}

impl PointSizeRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn validate(self) -> ChartResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 {
            return Err(ChartError::InvalidConfig(
                "point size range must be finite and >= 0".to_owned(),
            ));
        }
        if self.max < self.min {
            return Err(ChartError::InvalidConfig(
                "point size range max must be >= min".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for PointSizeRange {
    fn default() -> Self {
        Self::new(2.0, 12.0)
    }
}

/// Global inputs of normalization shared by every panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub point_size_range: PointSizeRange,
    pub default_color: Rgb,
}

impl NormalizerConfig {
    #[must_use]
    pub fn key(&self) -> NormalizerKey {
        NormalizerKey {
            size_min: OrderedFloat(self.point_size_range.min),
            size_max: OrderedFloat(self.point_size_range.max),
            color: self.default_color.to_array().map(OrderedFloat),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            point_size_range: PointSizeRange::default(),
            default_color: Rgb::new(0.25, 0.55, 0.95),
        }
    }
}

/// Hashable identity of a [`NormalizerConfig`], used for memoization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalizerKey {
    size_min: OrderedFloat<f64>,
    size_max: OrderedFloat<f64>,
    color: [OrderedFloat<f32>; 3],
}

/// Padded data-space bounds actually used for placement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelBounds {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl PanelBounds {
    #[must_use]
    pub fn xmin(&self) -> f64 {
        self.x.min()
    }

    #[must_use]
    pub fn xmax(&self) -> f64 {
        self.x.max()
    }

    #[must_use]
    pub fn ymin(&self) -> f64 {
        self.y.min()
    }

    #[must_use]
    pub fn ymax(&self) -> f64 {
        self.y.max()
    }

    #[must_use]
    pub fn contains(&self, time: f64, price: f64) -> bool {
        self.x.contains(time) && self.y.contains(price)
    }
}

#[must_use]
pub fn unit_to_render(unit: f64) -> f64 {
    RENDER_MARGIN + unit * RENDER_EXTENT
}

/// Exact inverse of [`unit_to_render`], clamped to `[0, 1]`.
#[must_use]
pub fn render_to_unit(render: f64) -> f64 {
    ((render - RENDER_MARGIN) / RENDER_EXTENT).clamp(0.0, 1.0)
}

#[must_use]
pub fn render_to_clip(render: f64) -> f64 {
    render * 2.0 - 1.0
}

/// GPU-ready snapshot of one panel.
///
/// Owns the [`Panel`] it was derived from, so bounds and points used by
/// hit-testing always belong to the same snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPanel {
    source: Arc<Panel>,
    positions: Vec<f32>,
    sizes: Vec<f32>,
    colors: Vec<f32>,
    bounds: PanelBounds,
}

impl PreparedPanel {
    #[must_use]
    pub fn source(&self) -> &Arc<Panel> {
        &self.source
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.source.id
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Clip-space positions, two floats per point.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Visual diameters in CSS pixels, one float per point.
    #[must_use]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// RGB colors, three floats per point.
    #[must_use]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    #[must_use]
    pub fn bounds(&self) -> PanelBounds {
        self.bounds
    }

    /// Render-space position of a data coordinate.
    #[must_use]
    pub fn data_to_render(&self, time: f64, price: f64) -> (f64, f64) {
        (
            unit_to_render(self.bounds.x.normalize(time)),
            unit_to_render(self.bounds.y.normalize(price)),
        )
    }

    /// Pixel offset of a data coordinate from a cell's top-left corner.
    #[must_use]
    pub fn data_to_cell_pixel(
        &self,
        time: f64,
        price: f64,
        cell_width: f64,
        cell_height: f64,
    ) -> (f64, f64) {
        let (render_x, render_y) = self.data_to_render(time, price);
        (render_x * cell_width, (1.0 - render_y) * cell_height)
    }

    /// Data coordinate under a pixel offset from a cell's top-left corner.
    #[must_use]
    pub fn cell_pixel_to_data(
        &self,
        local_x: f64,
        local_y: f64,
        cell_width: f64,
        cell_height: f64,
    ) -> (f64, f64) {
        let unit_x = render_to_unit(local_x / cell_width);
        let unit_y_down = render_to_unit(local_y / cell_height);
        let time = self.bounds.x.denormalize(unit_x);
        let price = self.bounds.ymax() - unit_y_down * self.bounds.y.span();
        (time, price)
    }
}

/// Normalizes one panel. Never fails: empty and degenerate panels fall back
/// to default spans.
#[must_use]
pub fn prepare_panel(source: Arc<Panel>, config: &NormalizerConfig) -> PreparedPanel {
    let count = source.points.len();
    if count == 0 {
        return PreparedPanel {
            source,
            positions: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            bounds: PanelBounds {
                x: AxisRange::UNIT,
                y: AxisRange::UNIT,
            },
        };
    }

    let mut xmin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymin = f64::INFINITY;
    let mut ymax = f64::NEG_INFINITY;
    let mut smin = f64::INFINITY;
    let mut smax = f64::NEG_INFINITY;
    for point in &source.points {
        xmin = xmin.min(point.time);
        xmax = xmax.max(point.time);
        ymin = ymin.min(point.price);
        ymax = ymax.max(point.price);
        let magnitude = point.magnitude();
        smin = smin.min(magnitude);
        smax = smax.max(magnitude);
    }

    let bounds = PanelBounds {
        x: AxisRange::padded(xmin, xmax),
        y: AxisRange::padded(ymin, ymax),
    };
    let size_span = if smax > smin { smax - smin } else { 1.0 };
    let size_range = config.point_size_range;
    let panel_color = source.default_color.unwrap_or(config.default_color);

    let mut positions = Vec::with_capacity(count * POSITION_COMPONENTS);
    let mut sizes = Vec::with_capacity(count * SIZE_COMPONENTS);
    let mut colors = Vec::with_capacity(count * COLOR_COMPONENTS);
    for point in &source.points {
        let render_x = unit_to_render(bounds.x.normalize(point.time));
        let render_y = unit_to_render(bounds.y.normalize(point.price));
        positions.push(render_to_clip(render_x) as f32);
        positions.push(render_to_clip(render_y) as f32);

        let t = ((point.magnitude() - smin) / size_span).clamp(0.0, 1.0);
        sizes.push((size_range.min + t * (size_range.max - size_range.min)) as f32);

        colors.extend_from_slice(&point.color.unwrap_or(panel_color).to_array());
    }

    trace!(panel_id = %source.id, count, "prepared panel");
    PreparedPanel {
        source,
        positions,
        sizes,
        colors,
        bounds,
    }
}

struct CacheEntry {
    source: Arc<Panel>,
    key: NormalizerKey,
    prepared: Arc<PreparedPanel>,
}

/// Memoizes prepared panels by panel id, source identity and normalizer key.
#[derive(Default)]
pub struct PreparedPanelCache {
    entries: IndexMap<String, CacheEntry>,
    last_misses: usize,
}

impl PreparedPanelCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns one prepared panel per input panel, in input order.
    ///
    /// Entries whose source `Arc` and normalizer key are unchanged are
    /// reused; every other panel is normalized again. Entries for panels that
    /// are no longer present are dropped.
    pub fn prepare_all(
        &mut self,
        panels: &[Arc<Panel>],
        config: &NormalizerConfig,
    ) -> Vec<Arc<PreparedPanel>> {
        let key = config.key();
        let mut reused: Vec<Option<Arc<PreparedPanel>>> = panels
            .iter()
            .map(|panel| {
                self.entries.get(&panel.id).and_then(|entry| {
                    (entry.key == key && Arc::ptr_eq(&entry.source, panel))
                        .then(|| Arc::clone(&entry.prepared))
                })
            })
            .collect();

        let misses: Vec<usize> = reused
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.is_none().then_some(index))
            .collect();
        self.last_misses = misses.len();

        for (index, prepared) in prepare_misses(panels, &misses, config) {
            reused[index] = Some(prepared);
        }

        let prepared: Vec<Arc<PreparedPanel>> = reused.into_iter().flatten().collect();
        self.entries = panels
            .iter()
            .zip(&prepared)
            .map(|(panel, prepared)| {
                (
                    panel.id.clone(),
                    CacheEntry {
                        source: Arc::clone(panel),
                        key,
                        prepared: Arc::clone(prepared),
                    },
                )
            })
            .collect();
        prepared
    }

    /// Number of panels normalized by the last `prepare_all` call.
    #[must_use]
    pub fn last_misses(&self) -> usize {
        self.last_misses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(not(feature = "parallel-prepare"))]
fn prepare_misses(
    panels: &[Arc<Panel>],
    misses: &[usize],
    config: &NormalizerConfig,
) -> Vec<(usize, Arc<PreparedPanel>)> {
    misses
        .iter()
        .map(|&index| {
            (
                index,
                Arc::new(prepare_panel(Arc::clone(&panels[index]), config)),
            )
        })
        .collect()
}

#[cfg(feature = "parallel-prepare")]
fn prepare_misses(
    panels: &[Arc<Panel>],
    misses: &[usize],
    config: &NormalizerConfig,
) -> Vec<(usize, Arc<PreparedPanel>)> {
    use rayon::prelude::*;

    misses
        .par_iter()
        .map(|&index| {
            (
                index,
                Arc::new(prepare_panel(Arc::clone(&panels[index]), config)),
            )
        })
        .collect()
}
