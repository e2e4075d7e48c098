//! Pointer hit-testing and tooltip state.
//!
//! Hit-testing is the inverse of normalization: a pointer position is mapped
//! to a cell by [`GridLayout::cell_at`], then to data space with the exact
//! [`crate::core::PanelBounds`] of that cell's prepared snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{GridLayout, PreparedPanel, TradeSide};

/// Tolerance window half-width, as a fraction of each padded axis span.
pub const HIT_TOLERANCE_FRACTION: f64 = 0.02;

/// One data point surfaced in a tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TooltipPoint {
    pub price: f64,
    pub time: f64,
    pub size: f64,
    pub side: Option<TradeSide>,
}

/// Pointer position resolved to a panel and data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerQuery {
    pub panel_index: usize,
    pub time: f64,
    pub price: f64,
    pub time_tolerance: f64,
    pub price_tolerance: f64,
}

/// Tooltip payload consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TooltipState {
    pub visible: bool,
    pub screen_x: f64,
    pub screen_y: f64,
    pub panel_index: Option<usize>,
    pub panel_id: Option<String>,
    pub points: Vec<TooltipPoint>,
}

impl TooltipState {
    #[must_use]
    pub fn hidden() -> Self {
        Self::default()
    }
}

/// Maps an element-local pointer position to data coordinates.
///
/// Returns `None` outside every cell, in the gap between cells, or past the
/// last panel.
#[must_use]
pub fn resolve_pointer(
    layout: &GridLayout,
    panels: &[Arc<PreparedPanel>],
    x: f64,
    y: f64,
) -> Option<PointerQuery> {
    let hit = layout.cell_at(x, y)?;
    let panel = panels.get(hit.index)?;
    let (time, price) = panel.cell_pixel_to_data(
        hit.local_x,
        hit.local_y,
        layout.cell_width(),
        layout.cell_height(),
    );
    let bounds = panel.bounds();
    Some(PointerQuery {
        panel_index: hit.index,
        time,
        price,
        time_tolerance: bounds.x.span() * HIT_TOLERANCE_FRACTION,
        price_tolerance: bounds.y.span() * HIT_TOLERANCE_FRACTION,
    })
}

/// Indices of the panel's points inside the query's tolerance window, in
/// original point order.
#[must_use]
pub fn points_within_tolerance(
    panel: &PreparedPanel,
    query: &PointerQuery,
) -> SmallVec<[usize; 8]> {
    panel
        .source()
        .points
        .iter()
        .enumerate()
        .filter(|(_, point)| {
            (point.time - query.time).abs() <= query.time_tolerance
                && (point.price - query.price).abs() <= query.price_tolerance
        })
        .map(|(index, _)| index)
        .collect()
}

/// Resolves the tooltip for a pointer position. Misses yield a hidden tooltip.
#[must_use]
pub fn hit_test(
    layout: &GridLayout,
    panels: &[Arc<PreparedPanel>],
    x: f64,
    y: f64,
) -> TooltipState {
    let Some(query) = resolve_pointer(layout, panels, x, y) else {
        return TooltipState::hidden();
    };
    let panel = &panels[query.panel_index];
    let hits = points_within_tolerance(panel, &query);
    if hits.is_empty() {
        return TooltipState::hidden();
    }

    let points = hits
        .iter()
        .map(|&index| {
            let point = &panel.source().points[index];
            TooltipPoint {
                price: point.price,
                time: point.time,
                size: point.magnitude(),
                side: point.side,
            }
        })
        .collect();
    TooltipState {
        visible: true,
        screen_x: x,
        screen_y: y,
        panel_index: Some(query.panel_index),
        panel_id: Some(panel.id().to_owned()),
        points,
    }
}

/// Pointer tracking and the tooltip it currently drives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionState {
    cursor: Option<(f64, f64)>,
    tooltip: TooltipState,
}

impl InteractionState {
    #[must_use]
    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    #[must_use]
    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64, tooltip: TooltipState) {
        self.cursor = Some((x, y));
        self.tooltip = tooltip;
    }

    pub fn on_pointer_leave(&mut self) {
        self.cursor = None;
        self.tooltip = TooltipState::hidden();
    }
}
