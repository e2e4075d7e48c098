//! Tiled frame planning: one point draw per non-empty panel, each confined
//! to its grid cell by a viewport and an identical scissor rectangle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{GridLayout, PreparedPanel, Rgb};
use crate::error::{ChartError, ChartResult};
use crate::render::{BufferManager, PanelBuffers};

/// Pixel rectangle on the rendering surface, in device pixels.
///
/// Uses the surface's bottom-up convention: `y` is the distance from the
/// bottom edge to the rectangle's bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SurfaceRect {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    pub fn fits_within(&self, surface_width: u32, surface_height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(surface_width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(surface_height)
    }

    /// Top edge measured from the surface's top, for top-left-origin APIs.
    #[must_use]
    pub fn top_from(&self, surface_height: u32) -> u32 {
        surface_height.saturating_sub(self.y + self.height)
    }
}

/// Frame-wide style values shared by every draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameStyle {
    pub clear_color: Rgb,
    pub point_alpha: f32,
    /// Must equal the ratio the backend surface was configured with.
    pub device_pixel_ratio: f64,
}

/// One point-sprite draw call.
#[derive(Debug, Clone, Copy)]
pub struct PanelDraw<'a> {
    pub panel_index: usize,
    pub buffers: &'a PanelBuffers,
    pub viewport: SurfaceRect,
    pub scissor: SurfaceRect,
}

/// Backend-agnostic description of one full surface repaint.
///
/// Draws borrow their buffers from the [`BufferManager`], so buffers cannot
/// be released while a frame referencing them exists.
#[derive(Debug, Clone)]
pub struct PointFrame<'a> {
    pub surface_width: u32,
    pub surface_height: u32,
    pub style: FrameStyle,
    pub draws: Vec<PanelDraw<'a>>,
}

impl PointFrame<'_> {
    pub fn validate(&self) -> ChartResult<()> {
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(ChartError::InvalidViewport {
                width: self.surface_width,
                height: self.surface_height,
            });
        }
        self.style.clear_color.validate()?;
        if !self.style.point_alpha.is_finite() || !(0.0..=1.0).contains(&self.style.point_alpha) {
            return Err(ChartError::InvalidData(
                "point alpha must be finite and in [0, 1]".to_owned(),
            ));
        }
        if !self.style.device_pixel_ratio.is_finite() || self.style.device_pixel_ratio <= 0.0 {
            return Err(ChartError::InvalidData(
                "device pixel ratio must be finite and > 0".to_owned(),
            ));
        }
        for draw in &self.draws {
            for rect in [draw.viewport, draw.scissor] {
                if rect.is_empty() || !rect.fits_within(self.surface_width, self.surface_height) {
                    return Err(ChartError::InvalidData(format!(
                        "draw for panel {} has a rectangle outside the surface",
                        draw.panel_index
                    )));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

/// Surface rectangle of cell `index`, in device pixels.
///
/// `y = surface_height - (cell_top + cell_height)`, clamped so it is never
/// negative and the cell never extends past the bottom edge; width and
/// height are clipped to the surface.
#[must_use]
pub fn cell_surface_rect(
    layout: &GridLayout,
    index: usize,
    device_pixel_ratio: f64,
) -> Option<SurfaceRect> {
    let cell = layout.cell_rect(index)?;
    let (surface_width, surface_height) = layout.backing_size(device_pixel_ratio);
    let to_px = |value: f64| (value * device_pixel_ratio).round().max(0.0) as u32;

    let x = to_px(cell.x).min(surface_width);
    let width = to_px(cell.width).min(surface_width - x);
    let top = to_px(cell.y);
    let height = to_px(cell.height).min(surface_height);
    let y = surface_height
        .saturating_sub(top.saturating_add(height))
        .min(surface_height - height);

    Some(SurfaceRect {
        x,
        y,
        width,
        height,
    })
}

/// Plans the draws for the current prepared panels.
///
/// Panels without points, and cells with no visible pixels, are skipped.
/// Every other panel must have live buffers for its exact snapshot.
pub fn build_frame<'a>(
    layout: &GridLayout,
    panels: &[Arc<PreparedPanel>],
    buffers: &'a BufferManager,
    style: FrameStyle,
) -> ChartResult<PointFrame<'a>> {
    let device_pixel_ratio = style.device_pixel_ratio;
    let (surface_width, surface_height) = layout.backing_size(device_pixel_ratio);

    let mut draws = Vec::with_capacity(panels.len());
    for (index, panel) in panels.iter().enumerate() {
        if panel.is_empty() {
            continue;
        }
        let Some(rect) = cell_surface_rect(layout, index, device_pixel_ratio) else {
            continue;
        };
        if rect.is_empty() {
            continue;
        }
        let panel_buffers = buffers.buffers_for(index, panel).ok_or_else(|| {
            ChartError::InvalidData(format!(
                "panel {index} (`{}`) has no buffers for its current snapshot",
                panel.id()
            ))
        })?;
        draws.push(PanelDraw {
            panel_index: index,
            buffers: panel_buffers,
            viewport: rect,
            scissor: rect,
        });
    }

    Ok(PointFrame {
        surface_width: surface_width.max(1),
        surface_height: surface_height.max(1),
        style,
        draws,
    })
}

#[cfg(test)]
mod tests {
    use super::{FrameStyle, build_frame, cell_surface_rect};
    use crate::core::{GridLayout, GridLayoutConfig, Rgb};
    use crate::render::BufferManager;

    fn layout(panel_count: usize) -> GridLayout {
        layout_with_width(panel_count, 210.0)
    }

    fn layout_with_width(panel_count: usize, width: f64) -> GridLayout {
        GridLayout::compute(
            panel_count,
            GridLayoutConfig {
                columns: 2,
                cell_height: 100.0,
                gap: 10.0,
                bottom_margin: 20.0,
            },
            width,
        )
        .expect("layout")
    }

    #[test]
    fn viewport_y_uses_bottom_up_convention() {
        let layout = layout(4);
        assert_eq!(layout.total_height(), 230.0);

        let top_row = cell_surface_rect(&layout, 0, 1.0).expect("rect");
        assert_eq!(top_row.y, 230 - 100);
        assert_eq!(top_row.top_from(230), 0);

        let bottom_row = cell_surface_rect(&layout, 3, 1.0).expect("rect");
        assert_eq!(bottom_row.x, 110);
        assert_eq!(bottom_row.y, 230 - (110 + 100));
    }

    #[test]
    fn device_pixel_ratio_scales_rectangles() {
        let layout = layout(2);
        let rect = cell_surface_rect(&layout, 1, 2.0).expect("rect");
        assert_eq!(rect.x, 220);
        assert_eq!(rect.width, 200);
        assert_eq!(rect.height, 200);
        assert_eq!(rect.y, 2 * 120 - 200);
    }

    #[test]
    fn fractional_ratio_frame_matches_layout_backing_size() {
        let style = FrameStyle {
            clear_color: Rgb::new(0.0, 0.0, 0.0),
            point_alpha: 1.0,
            device_pixel_ratio: 1.3,
        };
        let buffers = BufferManager::new();
        for width in [5.0, 805.0, 1005.0] {
            let layout = layout_with_width(3, width);
            let frame = build_frame(&layout, &[], &buffers, style).expect("frame");
            assert_eq!(
                (frame.surface_width, frame.surface_height),
                layout.backing_size(1.3)
            );
            let rect = cell_surface_rect(&layout, 2, 1.3).expect("rect");
            assert!(rect.fits_within(frame.surface_width, frame.surface_height));
        }
    }

    #[test]
    fn out_of_range_index_has_no_rect() {
        assert!(cell_surface_rect(&layout(3), 3, 1.0).is_none());
    }
}
