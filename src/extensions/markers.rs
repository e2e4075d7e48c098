use serde::{Deserialize, Serialize};

use crate::core::{CellRect, PreparedPanel, RENDER_EXTENT, RENDER_MARGIN, Rgb};
use crate::error::{ChartError, ChartResult};
use crate::render::{OverlayFrame, OverlayLabel, OverlayLine, TextHAlign};

/// Externally supplied event drawn as a crosshair over one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelMarker {
    pub time: f64,
    pub price: f64,
    #[serde(default)]
    pub label: Option<String>,
}

impl PanelMarker {
    #[must_use]
    pub fn new(time: f64, price: f64) -> Self {
        Self {
            time,
            price,
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerOverlayStyle {
    pub line_color: Rgb,
    pub stroke_width: f64,
    pub label_color: Rgb,
    pub label_font_size_px: f64,
    pub label_offset_px: f64,
}

impl Default for MarkerOverlayStyle {
    fn default() -> Self {
        Self {
            line_color: Rgb::new(0.95, 0.75, 0.2),
            stroke_width: 1.0,
            label_color: Rgb::new(0.9, 0.9, 0.9),
            label_font_size_px: 11.0,
            label_offset_px: 4.0,
        }
    }
}

impl MarkerOverlayStyle {
    fn validate(self) -> ChartResult<Self> {
        for (value, name) in [
            (self.stroke_width, "stroke_width"),
            (self.label_font_size_px, "label_font_size_px"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::InvalidData(format!(
                    "marker style `{name}` must be finite and > 0"
                )));
            }
        }
        if !self.label_offset_px.is_finite() {
            return Err(ChartError::InvalidData(
                "marker style `label_offset_px` must be finite".to_owned(),
            ));
        }
        self.line_color.validate()?;
        self.label_color.validate()?;
        Ok(self)
    }
}

/// Appends crosshair geometry for `markers` on one panel to `overlay`.
///
/// Markers are placed with the panel's stored bounds, the same mapping the
/// point cloud uses. Markers outside those bounds, or with non-finite
/// coordinates, are skipped. Returns how many markers were placed.
pub fn append_marker_crosshairs(
    overlay: &mut OverlayFrame,
    markers: &[PanelMarker],
    panel: &PreparedPanel,
    cell: CellRect,
    style: MarkerOverlayStyle,
) -> ChartResult<usize> {
    let style = style.validate()?;
    let bounds = panel.bounds();
    let plot_left = cell.x + RENDER_MARGIN * cell.width;
    let plot_right = cell.x + (RENDER_MARGIN + RENDER_EXTENT) * cell.width;
    let plot_top = cell.y + RENDER_MARGIN * cell.height;
    let plot_bottom = cell.y + (RENDER_MARGIN + RENDER_EXTENT) * cell.height;

    let mut placed = 0;
    for marker in markers {
        if !marker.time.is_finite()
            || !marker.price.is_finite()
            || !bounds.contains(marker.time, marker.price)
        {
            continue;
        }
        let (local_x, local_y) =
            panel.data_to_cell_pixel(marker.time, marker.price, cell.width, cell.height);
        let x = cell.x + local_x;
        let y = cell.y + local_y;

        overlay.lines.push(OverlayLine {
            x1: plot_left,
            y1: y,
            x2: plot_right,
            y2: y,
            stroke_width: style.stroke_width,
            color: style.line_color,
        });
        overlay.lines.push(OverlayLine {
            x1: x,
            y1: plot_top,
            x2: x,
            y2: plot_bottom,
            stroke_width: style.stroke_width,
            color: style.line_color,
        });
        if let Some(text) = marker.label.as_ref().filter(|text| !text.is_empty()) {
            overlay.labels.push(OverlayLabel {
                text: text.clone(),
                x: x + style.label_offset_px,
                y: y - style.label_offset_px,
                font_size_px: style.label_font_size_px,
                color: style.label_color,
                h_align: TextHAlign::Left,
            });
        }
        placed += 1;
    }
    Ok(placed)
}
