use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Layout inputs owned by the host configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayoutConfig {
    pub columns: u32,
    pub cell_height: f64,
    pub gap: f64,
    /// Fixed allowance below the last row for labels.
    pub bottom_margin: f64,
}

impl GridLayoutConfig {
    pub fn validate(self) -> ChartResult<Self> {
        if self.columns == 0 {
            return Err(ChartError::InvalidConfig(
                "grid column count must be >= 1".to_owned(),
            ));
        }
        if !self.cell_height.is_finite() || self.cell_height <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "grid cell height must be finite and > 0".to_owned(),
            ));
        }
        for (value, name) in [(self.gap, "gap"), (self.bottom_margin, "bottom_margin")] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "grid `{name}` must be finite and >= 0"
                )));
            }
        }
        Ok(self)
    }
}

impl Default for GridLayoutConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            cell_height: 280.0,
            gap: 20.0,
            bottom_margin: 24.0,
        }
    }
}

/// Pixel rectangle in element space (top-left origin, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CellRect {
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Cell resolved under a pointer, with the pointer's offset inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHit {
    pub index: usize,
    pub column: u32,
    pub row: u32,
    pub local_x: f64,
    pub local_y: f64,
}

/// Row/column placement of every panel plus the canvas height it requires.
///
/// The layout is the source of truth for canvas height; the backing store is
/// sized from `total_height`, never from the element's observed height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    panel_count: usize,
    columns: u32,
    rows: u32,
    cell_width: f64,
    cell_height: f64,
    gap: f64,
    canvas_width: f64,
    total_height: f64,
}

impl GridLayout {
    pub fn compute(
        panel_count: usize,
        config: GridLayoutConfig,
        canvas_width: f64,
    ) -> ChartResult<Self> {
        let config = config.validate()?;
        if !canvas_width.is_finite() || canvas_width < 0.0 {
            return Err(ChartError::InvalidData(
                "canvas width must be finite and >= 0".to_owned(),
            ));
        }

        let columns = config.columns;
        let rows = u32::try_from(panel_count.div_ceil(columns as usize)).map_err(|_| {
            ChartError::InvalidData(format!("panel count {panel_count} exceeds grid capacity"))
        })?;
        let gaps = f64::from(columns - 1) * config.gap;
        let cell_width = ((canvas_width - gaps) / f64::from(columns)).max(0.0);
        let total_height = f64::from(rows) * config.cell_height
            + f64::from(rows.saturating_sub(1)) * config.gap
            + config.bottom_margin;

        Ok(Self {
            panel_count,
            columns,
            rows,
            cell_width,
            cell_height: config.cell_height,
            gap: config.gap,
            canvas_width,
            total_height,
        })
    }

    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    #[must_use]
    pub fn cell_height(&self) -> f64 {
        self.cell_height
    }

    #[must_use]
    pub fn gap(&self) -> f64 {
        self.gap
    }

    #[must_use]
    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.total_height
    }

    /// Backing-store size in device pixels.
    #[must_use]
    pub fn backing_size(&self, device_pixel_ratio: f64) -> (u32, u32) {
        (
            (self.canvas_width * device_pixel_ratio).round() as u32,
            (self.total_height * device_pixel_ratio).round() as u32,
        )
    }

    #[must_use]
    pub fn cell_rect(&self, index: usize) -> Option<CellRect> {
        if index >= self.panel_count {
            return None;
        }
        let columns = self.columns as usize;
        let column = (index % columns) as f64;
        let row = (index / columns) as f64;
        Some(CellRect {
            x: column * (self.cell_width + self.gap),
            y: row * (self.cell_height + self.gap),
            width: self.cell_width,
            height: self.cell_height,
        })
    }

    /// Resolves the cell under an element-local pointer position.
    ///
    /// Returns `None` outside the grid, past the last panel, or inside the
    /// gap between cells.
    #[must_use]
    pub fn cell_at(&self, x: f64, y: f64) -> Option<CellHit> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 || self.cell_width <= 0.0 {
            return None;
        }
        let column = (x / (self.cell_width + self.gap)).floor();
        let row = (y / (self.cell_height + self.gap)).floor();
        if column >= f64::from(self.columns) || row >= f64::from(self.rows) {
            return None;
        }
        let (column, row) = (column as u32, row as u32);
        let index = row as usize * self.columns as usize + column as usize;
        let rect = self.cell_rect(index)?;
        if !rect.contains(x, y) {
            return None;
        }
        Some(CellHit {
            index,
            column,
            row,
            local_x: x - rect.x,
            local_y: y - rect.y,
        })
    }
}
