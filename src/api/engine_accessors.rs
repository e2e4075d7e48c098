use std::sync::Arc;

use crate::core::{GridLayout, Panel, PreparedPanel};
use crate::extensions::PanelMarker;
use crate::interaction::TooltipState;
use crate::render::GpuBackend;

use super::engine::FrameStats;
use super::{InvalidationMask, LifecycleState, ScatterGridConfig, ScatterGridEngine};

impl<B: GpuBackend> ScatterGridEngine<B> {
    #[must_use]
    pub fn config(&self) -> ScatterGridConfig {
        self.config
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[must_use]
    pub fn panels(&self) -> &[Arc<Panel>] {
        &self.panels
    }

    /// Prepared snapshots, one per panel in panel order.
    #[must_use]
    pub fn prepared_panels(&self) -> &[Arc<PreparedPanel>] {
        &self.prepared
    }

    #[must_use]
    pub fn markers_for(&self, panel_id: &str) -> &[PanelMarker] {
        self.markers
            .get(panel_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state
    }

    /// Canvas size in CSS pixels: `(canvas width, total height)`.
    #[must_use]
    pub fn canvas_size(&self) -> (f64, f64) {
        (self.layout.canvas_width(), self.layout.total_height())
    }

    /// Backing-store size in device pixels.
    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    #[must_use]
    pub fn tooltip(&self) -> &TooltipState {
        self.interaction.tooltip()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.interaction.cursor()
    }

    #[must_use]
    pub fn has_pending_invalidation(&self) -> bool {
        !self.pending.is_none()
    }

    #[must_use]
    pub fn pending_invalidation(&self) -> InvalidationMask {
        self.pending
    }

    #[must_use]
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Number of panel buffer sets currently live on the backend.
    #[must_use]
    pub fn live_buffer_sets(&self) -> usize {
        self.buffers.live_set_count()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
