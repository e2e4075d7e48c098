use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ChartError, ChartResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> ChartResult<f64> {
    value.to_f64().ok_or_else(|| {
        ChartError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Start of the UTC minute containing `time`, in unix seconds.
#[must_use]
pub fn minute_floor_unix_seconds(time: DateTime<Utc>) -> i64 {
    time.timestamp().div_euclid(60) * 60
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::minute_floor_unix_seconds;

    #[test]
    fn minute_floor_truncates_seconds() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 59).unwrap();
        let floor = minute_floor_unix_seconds(time);
        assert_eq!(floor % 60, 0);
        assert_eq!(time.timestamp() - floor, 59);
    }
}
