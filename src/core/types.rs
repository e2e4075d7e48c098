use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::core::scale::AxisRange;
use crate::error::{ChartError, ChartResult};

/// RGB color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Rgb {
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.red, self.green, self.blue]
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One plotted sample: `time` is the x axis (seconds), `price` the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: f64,
    pub price: f64,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub side: Option<TradeSide>,
}

impl Point {
    #[must_use]
    pub const fn new(time: f64, price: f64) -> Self {
        Self {
            time,
            price,
            size: None,
            color: None,
            side: None,
        }
    }

    pub fn from_decimal_time(time: DateTime<Utc>, price: Decimal) -> ChartResult<Self> {
        Ok(Self::new(
            datetime_to_unix_seconds(time),
            decimal_to_f64(price, "price")?,
        ))
    }

    #[must_use]
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: TradeSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Magnitude used for sizing; missing magnitude counts as 1.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.size.unwrap_or(1.0)
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.time.is_finite() || !self.price.is_finite() {
            return Err(ChartError::InvalidData(
                "point time and price must be finite".to_owned(),
            ));
        }
        if let Some(size) = self.size {
            if !size.is_finite() || size < 0.0 {
                return Err(ChartError::InvalidData(
                    "point size must be finite and >= 0".to_owned(),
                ));
            }
        }
        if let Some(color) = self.color {
            color.validate()?;
        }
        Ok(())
    }
}

/// One independently-normalized dataset rendered in one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub default_color: Option<Rgb>,
}

impl Panel {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            points: Vec::new(),
            default_color: None,
        }
    }

    #[must_use]
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    #[must_use]
    pub fn with_default_color(mut self, color: Rgb) -> Self {
        self.default_color = Some(color);
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.id.is_empty() {
            return Err(ChartError::InvalidData(
                "panel id must not be empty".to_owned(),
            ));
        }
        if let Some(color) = self.default_color {
            color.validate()?;
        }
        for (index, point) in self.points.iter().enumerate() {
            point.validate().map_err(|err| {
                ChartError::InvalidData(format!("panel `{}` point {index}: {err}", self.id))
            })?;
        }
        self.validate_extent()
    }

    /// Rejects panels whose padded axis ranges would overflow `f64`.
    fn validate_extent(&self) -> ChartResult<()> {
        let Some(first) = self.points.first() else {
            return Ok(());
        };
        let (mut tmin, mut tmax) = (first.time, first.time);
        let (mut pmin, mut pmax) = (first.price, first.price);
        for point in &self.points[1..] {
            tmin = tmin.min(point.time);
            tmax = tmax.max(point.time);
            pmin = pmin.min(point.price);
            pmax = pmax.max(point.price);
        }
        for (axis, min, max) in [("time", tmin, tmax), ("price", pmin, pmax)] {
            if !AxisRange::padded(min, max).is_finite() {
                return Err(ChartError::InvalidData(format!(
                    "panel `{}` {axis} extent [{min}, {max}] is too wide to normalize",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Panel, Point, Rgb};

    #[test]
    fn missing_magnitude_counts_as_one() {
        assert_eq!(Point::new(1.0, 2.0).magnitude(), 1.0);
        assert_eq!(Point::new(1.0, 2.0).with_size(4.5).magnitude(), 4.5);
    }

    #[test]
    fn panel_validation_rejects_non_finite_points() {
        let panel = Panel::new("p", "P").with_points(vec![Point::new(f64::NAN, 1.0)]);
        assert!(panel.validate().is_err());

        let panel = Panel::new("p", "P").with_points(vec![Point::new(0.0, 1.0).with_size(-1.0)]);
        assert!(panel.validate().is_err());

        let panel = Panel::new("p", "P")
            .with_points(vec![Point::new(0.0, 1.0).with_color(Rgb::new(0.1, 0.2, 0.3))]);
        assert!(panel.validate().is_ok());
    }

    #[test]
    fn panel_validation_rejects_extents_that_overflow_padding() {
        let panel = Panel::new("p", "P")
            .with_points(vec![Point::new(0.0, -1e308), Point::new(1.0, 1e308)]);
        let err = panel.validate().expect_err("price extent overflows");
        assert!(err.to_string().contains("price extent"));

        let panel = Panel::new("p", "P")
            .with_points(vec![Point::new(-1e308, 1.0), Point::new(1e308, 2.0)]);
        let err = panel.validate().expect_err("time extent overflows");
        assert!(err.to_string().contains("time extent"));

        let panel = Panel::new("p", "P")
            .with_points(vec![Point::new(0.0, 1e308), Point::new(1.0, 1e308)]);
        assert!(panel.validate().is_ok());
    }
}
