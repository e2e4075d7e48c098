use serde::{Deserialize, Serialize};

/// Fraction of the data span added on each end of an axis.
pub const AXIS_PADDING_FRACTION: f64 = 0.05;

/// Span substituted for a degenerate (`max == min`) axis.
pub const DEGENERATE_SPAN: f64 = 1.0;

/// Closed data-space interval used to place points along one axis.
///
/// `max > min` holds for every finite extent, so `normalize`/`denormalize` never divide by
/// zero. The same value drives the forward mapping during normalization and
/// the inverse mapping during hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    min: f64,
    max: f64,
}

impl AxisRange {
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    /// Builds the padded range for a raw data extent.
    ///
    /// The span is widened by `2 * AXIS_PADDING_FRACTION` around its center;
    /// a degenerate extent is first given a span of `DEGENERATE_SPAN`, or a
    /// few ulps of the value when that is wider. Extents too wide for `f64`
    /// produce a range that fails [`Self::is_finite`].
    #[must_use]
    pub fn padded(raw_min: f64, raw_max: f64) -> Self {
        let center = raw_min * 0.5 + raw_max * 0.5;
        let span = raw_max - raw_min;
        let span = if span > 0.0 {
            span
        } else {
            DEGENERATE_SPAN.max(center.abs() * f64::EPSILON * 4.0)
        };
        let half = span * 0.5 * (1.0 + 2.0 * AXIS_PADDING_FRACTION);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    /// Whether both ends and the span are finite, so `normalize` is usable.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.span().is_finite()
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Maps `value` into `[0, 1]`, clamping floating point overshoot.
    #[must_use]
    pub fn normalize(self, value: f64) -> f64 {
        ((value - self.min) / self.span()).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn denormalize(self, unit: f64) -> f64 {
        self.min + unit * self.span()
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::UNIT
    }
}
