use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::{GridLayout, Panel, PreparedPanel, PreparedPanelCache};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{MarkerOverlayStyle, PanelMarker, append_marker_crosshairs};
use crate::interaction::{InteractionState, TooltipState, hit_test};
use crate::render::{BufferManager, GpuBackend, OverlayFrame, build_frame};

use super::{InvalidationMask, InvalidationTopic, LifecycleState, ScatterGridConfig};

/// Counters describing the work done by the engine so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames_rendered: u64,
    /// Draw calls issued by the most recent frame.
    pub last_draw_count: usize,
    pub buffer_sets_created: usize,
    pub buffer_sets_released: usize,
    /// Buffer sync passes, one per frame that carried a data change.
    pub buffer_syncs: u64,
}

/// Orchestration facade consumed by host applications.
///
/// `ScatterGridEngine` owns the panel set, its prepared snapshots, the grid
/// layout, every GPU buffer (through [`BufferManager`]) and the pointer
/// state. Triggers only mark the pending [`InvalidationMask`]; the host's
/// frame callback drives [`Self::render_if_invalidated`].
pub struct ScatterGridEngine<B: GpuBackend> {
    pub(super) backend: B,
    pub(super) config: ScatterGridConfig,
    pub(super) state: LifecycleState,
    pub(super) panels: Vec<Arc<Panel>>,
    pub(super) markers: IndexMap<String, Vec<PanelMarker>>,
    pub(super) cache: PreparedPanelCache,
    pub(super) prepared: Vec<Arc<PreparedPanel>>,
    pub(super) layout: GridLayout,
    pub(super) surface: (u32, u32),
    pub(super) buffers: BufferManager,
    pub(super) pending: InvalidationMask,
    pub(super) interaction: InteractionState,
    pub(super) stats: FrameStats,
}

impl<B: GpuBackend> ScatterGridEngine<B> {
    /// Replaces the panel set.
    pub fn set_panels(&mut self, panels: Vec<Panel>) -> ChartResult<()> {
        self.set_panel_snapshots(panels.into_iter().map(Arc::new).collect())
    }

    /// Replaces the panel set with shared snapshots.
    ///
    /// Panels whose `Arc` is unchanged since the previous call keep their
    /// prepared snapshot and their GPU buffers.
    pub fn set_panel_snapshots(&mut self, panels: Vec<Arc<Panel>>) -> ChartResult<()> {
        self.ensure_live("set panels")?;
        validate_panel_set(&panels)?;

        let count_changed = panels.len() != self.panels.len();
        if count_changed {
            self.relayout(panels.len(), self.layout.canvas_width())?;
            self.pending.insert(InvalidationTopic::Layout);
        }
        self.panels = panels;
        self.reprepare();
        self.pending.insert(InvalidationTopic::Data);
        self.refresh_tooltip();
        debug!(
            panels = self.panels.len(),
            misses = self.cache.last_misses(),
            "panel set replaced"
        );
        Ok(())
    }

    /// Applies a new configuration, invalidating only what it affects.
    pub fn set_config(&mut self, config: ScatterGridConfig) -> ChartResult<()> {
        self.ensure_live("set config")?;
        config.validate()?;
        let previous = std::mem::replace(&mut self.config, config);

        if previous.layout_config() != config.layout_config()
            || previous.device_pixel_ratio != config.device_pixel_ratio
        {
            if let Err(err) = self.relayout(self.panels.len(), self.layout.canvas_width()) {
                self.config = previous;
                return Err(err);
            }
            self.pending.insert(InvalidationTopic::Layout);
        }
        if previous.normalizer_config() != config.normalizer_config() {
            self.reprepare();
            self.pending.insert(InvalidationTopic::Data);
        }
        if previous.frame_style() != config.frame_style() {
            self.pending.insert(InvalidationTopic::Style);
        }
        self.refresh_tooltip();
        Ok(())
    }

    /// Handles an observed change of the canvas's on-screen width.
    ///
    /// No-op after teardown. Prepared panels and buffers are untouched.
    pub fn resize(&mut self, canvas_width: f64) -> ChartResult<()> {
        if !self.state.is_live() {
            trace!(state = self.state.name(), "resize ignored");
            return Ok(());
        }
        if canvas_width == self.layout.canvas_width() {
            return Ok(());
        }
        self.relayout(self.panels.len(), canvas_width)?;
        self.pending.insert(InvalidationTopic::Resize);
        self.refresh_tooltip();
        Ok(())
    }

    /// Replaces the markers drawn over the panel with `panel_id`.
    pub fn set_markers(
        &mut self,
        panel_id: impl Into<String>,
        markers: Vec<PanelMarker>,
    ) -> ChartResult<()> {
        self.ensure_live("set markers")?;
        let panel_id = panel_id.into();
        if markers.is_empty() {
            self.markers.shift_remove(&panel_id);
        } else {
            self.markers.insert(panel_id, markers);
        }
        self.pending.insert(InvalidationTopic::Overlay);
        Ok(())
    }

    pub fn clear_markers(&mut self) {
        if !self.markers.is_empty() {
            self.markers.clear();
            self.pending.insert(InvalidationTopic::Overlay);
        }
    }

    /// Renders one frame if anything is pending.
    ///
    /// Returns `Ok(false)` without touching the backend when nothing is
    /// pending or the engine has been torn down.
    pub fn render_if_invalidated(&mut self) -> ChartResult<bool> {
        if !self.state.is_live() || self.pending.is_none() {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Renders one frame unconditionally.
    pub fn render(&mut self) -> ChartResult<()> {
        self.ensure_live("render")?;

        if self.pending.contains(InvalidationTopic::Data) {
            let sync = self.buffers.sync(&mut self.backend, &self.prepared)?;
            self.stats.buffer_syncs += 1;
            self.stats.buffer_sets_created += sync.created_sets;
            self.stats.buffer_sets_released += sync.released_sets;
        }

        let frame = build_frame(
            &self.layout,
            &self.prepared,
            &self.buffers,
            self.config.frame_style(),
        )?;
        self.backend.render(&frame)?;
        let draws = frame.draw_count();

        self.stats.frames_rendered += 1;
        self.stats.last_draw_count = draws;
        self.pending = InvalidationMask::none();
        self.state = self.state.after_render();
        debug!(
            draws,
            width = self.surface.0,
            height = self.surface.1,
            "frame rendered"
        );
        Ok(())
    }

    /// Updates the tooltip for an element-local pointer position.
    ///
    /// No-op (hidden tooltip) after teardown.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> &TooltipState {
        if self.state.is_live() {
            let tooltip = hit_test(&self.layout, &self.prepared, x, y);
            self.interaction.on_pointer_move(x, y, tooltip);
        }
        self.interaction.tooltip()
    }

    pub fn pointer_leave(&mut self) {
        self.interaction.on_pointer_leave();
    }

    /// Crosshair primitives for every panel's markers, in element pixels.
    pub fn marker_overlay(&self, style: MarkerOverlayStyle) -> ChartResult<OverlayFrame> {
        let mut overlay = OverlayFrame::default();
        if !self.state.is_live() {
            return Ok(overlay);
        }
        for (index, panel) in self.prepared.iter().enumerate() {
            let Some(markers) = self.markers.get(panel.id()) else {
                continue;
            };
            let Some(cell) = self.layout.cell_rect(index) else {
                continue;
            };
            append_marker_crosshairs(&mut overlay, markers, panel, cell, style)?;
        }
        Ok(overlay)
    }

    /// Releases every GPU buffer and moves to `TornDown`. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        let released = self.buffers.release_all(&mut self.backend);
        self.stats.buffer_sets_released += released;
        self.cache.clear();
        self.prepared.clear();
        self.panels.clear();
        self.markers.clear();
        self.interaction.on_pointer_leave();
        self.pending = InvalidationMask::none();
        self.state = LifecycleState::TornDown;
        debug!(released, "engine disposed");
    }

    fn ensure_live(&self, operation: &'static str) -> ChartResult<()> {
        if self.state.is_live() {
            Ok(())
        } else {
            Err(ChartError::Lifecycle {
                operation,
                state: self.state.name(),
            })
        }
    }

    fn reprepare(&mut self) {
        self.prepared = self
            .cache
            .prepare_all(&self.panels, &self.config.normalizer_config());
    }

    /// Recomputes the layout and reconfigures the surface if its backing
    /// size changed. Leaves the engine untouched on error.
    fn relayout(&mut self, panel_count: usize, canvas_width: f64) -> ChartResult<()> {
        let layout = GridLayout::compute(panel_count, self.config.layout_config(), canvas_width)?;
        let surface = backing_surface(&layout, self.config.device_pixel_ratio);
        if surface != self.surface {
            self.backend.configure_surface(surface.0, surface.1)?;
            self.surface = surface;
        }
        trace!(
            rows = layout.rows(),
            cell_width = layout.cell_width(),
            total_height = layout.total_height(),
            "layout recomputed"
        );
        self.layout = layout;
        Ok(())
    }

    /// Re-resolves the tooltip under the last known cursor so it never shows
    /// points from a replaced snapshot.
    fn refresh_tooltip(&mut self) {
        if let Some((x, y)) = self.interaction.cursor() {
            let tooltip = hit_test(&self.layout, &self.prepared, x, y);
            self.interaction.on_pointer_move(x, y, tooltip);
        }
    }
}

impl<B: GpuBackend> Drop for ScatterGridEngine<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn validate_panel_set(panels: &[Arc<Panel>]) -> ChartResult<()> {
    let mut seen = HashSet::with_capacity(panels.len());
    for panel in panels {
        panel.validate()?;
        if !seen.insert(panel.id.as_str()) {
            return Err(ChartError::InvalidData(format!(
                "duplicate panel id `{}`",
                panel.id
            )));
        }
    }
    Ok(())
}

/// Backing-store size of `layout`, never below one pixel per axis.
pub(super) fn backing_surface(layout: &GridLayout, device_pixel_ratio: f64) -> (u32, u32) {
    let (width, height) = layout.backing_size(device_pixel_ratio);
    (width.max(1), height.max(1))
}
