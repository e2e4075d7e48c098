use serde::{Deserialize, Serialize};

use crate::core::{GridLayoutConfig, NormalizerConfig, PointSizeRange, Rgb};
use crate::error::{ChartError, ChartResult};
use crate::render::FrameStyle;

pub const CONFIG_JSON_SCHEMA_V1: u32 = 1;

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load grid
/// setup without inventing their own ad-hoc format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScatterGridConfig {
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_cell_height_px")]
    pub cell_height_px: f64,
    #[serde(default = "default_gap_px")]
    pub gap_px: f64,
    /// Allowance below the last row for axis labels.
    #[serde(default = "default_bottom_margin_px")]
    pub bottom_margin_px: f64,
    #[serde(default)]
    pub point_size_range: PointSizeRange,
    #[serde(default = "default_point_color")]
    pub default_color: Rgb,
    #[serde(default = "default_clear_color")]
    pub clear_color: Rgb,
    #[serde(default = "default_point_alpha")]
    pub point_alpha: f32,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

impl Default for ScatterGridConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            cell_height_px: default_cell_height_px(),
            gap_px: default_gap_px(),
            bottom_margin_px: default_bottom_margin_px(),
            point_size_range: PointSizeRange::default(),
            default_color: default_point_color(),
            clear_color: default_clear_color(),
            point_alpha: default_point_alpha(),
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }
}

impl ScatterGridConfig {
    #[must_use]
    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_cell_height(mut self, cell_height_px: f64) -> Self {
        self.cell_height_px = cell_height_px;
        self
    }

    #[must_use]
    pub fn with_gap(mut self, gap_px: f64) -> Self {
        self.gap_px = gap_px;
        self
    }

    #[must_use]
    pub fn with_bottom_margin(mut self, bottom_margin_px: f64) -> Self {
        self.bottom_margin_px = bottom_margin_px;
        self
    }

    #[must_use]
    pub fn with_point_size_range(mut self, min: f64, max: f64) -> Self {
        self.point_size_range = PointSizeRange::new(min, max);
        self
    }

    #[must_use]
    pub fn with_default_color(mut self, color: Rgb) -> Self {
        self.default_color = color;
        self
    }

    #[must_use]
    pub fn with_device_pixel_ratio(mut self, device_pixel_ratio: f64) -> Self {
        self.device_pixel_ratio = device_pixel_ratio;
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        self.layout_config().validate()?;
        self.point_size_range.validate()?;
        self.default_color.validate()?;
        self.clear_color.validate()?;
        if !self.point_alpha.is_finite() || !(0.0..=1.0).contains(&self.point_alpha) {
            return Err(ChartError::InvalidConfig(
                "point alpha must be finite and in [0, 1]".to_owned(),
            ));
        }
        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "device pixel ratio must be finite and > 0".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn layout_config(&self) -> GridLayoutConfig {
        GridLayoutConfig {
            columns: self.columns,
            cell_height: self.cell_height_px,
            gap: self.gap_px,
            bottom_margin: self.bottom_margin_px,
        }
    }

    #[must_use]
    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            point_size_range: self.point_size_range,
            default_color: self.default_color,
        }
    }

    #[must_use]
    pub fn frame_style(&self) -> FrameStyle {
        FrameStyle {
            clear_color: self.clear_color,
            point_alpha: self.point_alpha,
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }

    pub fn to_json_contract_v1_pretty(&self) -> ChartResult<String> {
        let payload = ScatterGridConfigJsonContractV1 {
            schema_version: CONFIG_JSON_SCHEMA_V1,
            config: *self,
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ChartError::InvalidConfig(format!("failed to serialize config contract v1: {e}"))
        })
    }

    /// Parses either a bare config object or a versioned contract payload.
    pub fn from_json_compat_str(input: &str) -> ChartResult<Self> {
        let config = if let Ok(config) = serde_json::from_str::<ScatterGridConfig>(input) {
            config
        } else {
            let payload: ScatterGridConfigJsonContractV1 =
                serde_json::from_str(input).map_err(|e| {
                    ChartError::InvalidConfig(format!("failed to parse config json payload: {e}"))
                })?;
            if payload.schema_version != CONFIG_JSON_SCHEMA_V1 {
                return Err(ChartError::InvalidConfig(format!(
                    "unsupported config schema version: {}",
                    payload.schema_version
                )));
            }
            payload.config
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterGridConfigJsonContractV1 {
    pub schema_version: u32,
    pub config: ScatterGridConfig,
}

fn default_columns() -> u32 {
    3
}

fn default_cell_height_px() -> f64 {
    280.0
}

fn default_gap_px() -> f64 {
    20.0
}

fn default_bottom_margin_px() -> f64 {
    24.0
}

fn default_point_color() -> Rgb {
    NormalizerConfig::default().default_color
}

fn default_clear_color() -> Rgb {
    Rgb::new(0.06, 0.07, 0.09)
}

fn default_point_alpha() -> f32 {
    0.75
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}
