//! Trade ingestion helpers at the collaborator edge.
//!
//! These turn raw trade records into [`Panel`]s; the rendering core only ever
//! sees the resulting points.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{decimal_to_f64, minute_floor_unix_seconds};
use crate::core::{Panel, Point, Rgb, TradeSide};
use crate::error::{ChartError, ChartResult};

pub const BUY_COLOR: Rgb = Rgb::new(0.15, 0.75, 0.45);
pub const SELL_COLOR: Rgb = Rgb::new(0.9, 0.3, 0.3);

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub size: Decimal,
    pub side: TradeSide,
}

impl TradeRecord {
    pub fn to_point(&self) -> ChartResult<Point> {
        let color = match self.side {
            TradeSide::Buy => BUY_COLOR,
            TradeSide::Sell => SELL_COLOR,
        };
        Ok(Point::from_decimal_time(self.time, self.price)?
            .with_size(decimal_to_f64(self.size, "size")?)
            .with_side(self.side)
            .with_color(color))
    }
}

/// Builds one panel from trades, one point per trade, colored by side.
pub fn panel_from_trades(
    id: impl Into<String>,
    title: impl Into<String>,
    trades: &[TradeRecord],
) -> ChartResult<Panel> {
    let points = trades
        .iter()
        .map(TradeRecord::to_point)
        .collect::<ChartResult<Vec<_>>>()?;
    Ok(Panel::new(id, title).with_points(points))
}

/// Trades that share one UTC minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBucket {
    /// Minute start, unix seconds.
    pub minute_start: i64,
    /// Indices into the input slice, in input order.
    pub trade_indices: Vec<usize>,
    pub buy_volume: Decimal,
    pub sell_volume: Decimal,
}

impl MinuteBucket {
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.trade_indices.len()
    }

    pub fn total_volume(&self) -> ChartResult<Decimal> {
        checked_sum(self.buy_volume, self.sell_volume, "minute volume")
    }
}

fn checked_sum(lhs: Decimal, rhs: Decimal, what: &str) -> ChartResult<Decimal> {
    lhs.checked_add(rhs)
        .ok_or_else(|| ChartError::InvalidData(format!("{what} overflows decimal range")))
}

/// Groups trades by UTC minute in a single pass.
///
/// Buckets are ordered by first appearance of their minute, and each
/// bucket lists its trades in input order. Fails when a side's volume
/// overflows `Decimal`.
pub fn bucket_by_minute(trades: &[TradeRecord]) -> ChartResult<Vec<MinuteBucket>> {
    let mut buckets: IndexMap<i64, MinuteBucket> = IndexMap::new();
    for (index, trade) in trades.iter().enumerate() {
        let minute_start = minute_floor_unix_seconds(trade.time);
        let bucket = buckets.entry(minute_start).or_insert_with(|| MinuteBucket {
            minute_start,
            trade_indices: Vec::new(),
            buy_volume: Decimal::ZERO,
            sell_volume: Decimal::ZERO,
        });
        bucket.trade_indices.push(index);
        let volume = match trade.side {
            TradeSide::Buy => &mut bucket.buy_volume,
            TradeSide::Sell => &mut bucket.sell_volume,
        };
        *volume = checked_sum(*volume, trade.size, "minute volume")?;
    }
    Ok(buckets.into_values().collect())
}

/// One point per minute bucket: mean price at the minute start, sized by
/// total volume and colored by the dominant side.
pub fn minute_volume_panel(
    id: impl Into<String>,
    title: impl Into<String>,
    trades: &[TradeRecord],
) -> ChartResult<Panel> {
    let mut points = Vec::new();
    for bucket in bucket_by_minute(trades)? {
        let mut price_sum = Decimal::ZERO;
        for &index in &bucket.trade_indices {
            price_sum = checked_sum(price_sum, trades[index].price, "minute price sum")?;
        }
        let mean_price = price_sum
            .checked_div(Decimal::from(bucket.trade_count()))
            .ok_or_else(|| ChartError::InvalidData("empty minute bucket".to_owned()))?;
        let side = if bucket.buy_volume >= bucket.sell_volume {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        };
        points.push(
            Point::new(
                bucket.minute_start as f64,
                decimal_to_f64(mean_price, "mean price")?,
            )
            .with_size(decimal_to_f64(bucket.total_volume()?, "volume")?)
            .with_side(side)
            .with_color(match side {
                TradeSide::Buy => BUY_COLOR,
                TradeSide::Sell => SELL_COLOR,
            }),
        );
    }
    Ok(Panel::new(id, title).with_points(points))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{TradeRecord, bucket_by_minute, minute_volume_panel, panel_from_trades};
    use crate::core::TradeSide;
    use crate::error::ChartError;

    fn trade(minute: u32, second: u32, price: i64, size: i64, side: TradeSide) -> TradeRecord {
        TradeRecord {
            time: Utc.with_ymd_and_hms(2024, 1, 2, 10, minute, second).unwrap(),
            price: Decimal::new(price, 2),
            size: Decimal::from(size),
            side,
        }
    }

    fn trades() -> Vec<TradeRecord> {
        vec![
            trade(0, 5, 50, 2, TradeSide::Buy),
            trade(1, 0, 52, 1, TradeSide::Sell),
            trade(0, 59, 51, 3, TradeSide::Sell),
            trade(1, 30, 53, 4, TradeSide::Buy),
        ]
    }

    /// Reference grouping: re-filter the full list once per distinct minute.
    fn bucket_by_refiltering(trades: &[TradeRecord]) -> Vec<(i64, Vec<usize>)> {
        let mut minutes: Vec<i64> = Vec::new();
        for trade in trades {
            let minute = trade.time.timestamp().div_euclid(60) * 60;
            if !minutes.contains(&minute) {
                minutes.push(minute);
            }
        }
        minutes
            .into_iter()
            .map(|minute| {
                let indices = trades
                    .iter()
                    .enumerate()
                    .filter(|(_, trade)| trade.time.timestamp().div_euclid(60) * 60 == minute)
                    .map(|(index, _)| index)
                    .collect();
                (minute, indices)
            })
            .collect()
    }

    #[test]
    fn single_pass_grouping_matches_refiltering() {
        let trades = trades();
        let buckets = bucket_by_minute(&trades).expect("buckets");
        let linear: Vec<(i64, Vec<usize>)> = buckets
            .iter()
            .map(|bucket| (bucket.minute_start, bucket.trade_indices.clone()))
            .collect();
        assert_eq!(linear, bucket_by_refiltering(&trades));
        assert_eq!(buckets[0].buy_volume, Decimal::from(2));
        assert_eq!(buckets[0].sell_volume, Decimal::from(3));
    }

    #[test]
    fn trade_panel_keeps_side_and_size() {
        let panel = panel_from_trades("t", "Trades", &trades()).expect("panel");
        assert_eq!(panel.points.len(), 4);
        assert_eq!(panel.points[1].side, Some(TradeSide::Sell));
        assert_eq!(panel.points[3].size, Some(4.0));
        assert!((panel.points[0].price - 0.5).abs() < 1e-12);
    }

    #[test]
    fn minute_panel_has_one_point_per_minute() {
        let panel = minute_volume_panel("m", "Minutes", &trades()).expect("panel");
        assert_eq!(panel.points.len(), 2);
        assert_eq!(panel.points[0].side, Some(TradeSide::Sell));
        assert_eq!(panel.points[0].size, Some(5.0));
        assert!((panel.points[1].price - 0.525).abs() < 1e-12);
    }

    #[test]
    fn volume_overflow_is_an_error() {
        let mut trades = trades();
        trades[0].size = Decimal::MAX;
        trades[2].side = TradeSide::Buy;
        trades[2].size = Decimal::MAX;
        assert!(matches!(
            bucket_by_minute(&trades),
            Err(ChartError::InvalidData(_))
        ));
        assert!(minute_volume_panel("m", "Minutes", &trades).is_err());
    }

    #[test]
    fn cross_side_volume_overflow_is_an_error() {
        let mut trades = trades();
        trades[0].size = Decimal::MAX;
        trades[2].size = Decimal::MAX;
        let buckets = bucket_by_minute(&trades).expect("per-side volumes fit");
        assert!(buckets[0].total_volume().is_err());
        assert!(minute_volume_panel("m", "Minutes", &trades).is_err());
    }

    #[test]
    fn price_sum_overflow_is_an_error() {
        let mut trades = trades();
        trades[0].price = Decimal::MAX;
        trades[2].price = Decimal::MAX;
        assert!(matches!(
            minute_volume_panel("m", "Minutes", &trades),
            Err(ChartError::InvalidData(_))
        ));
    }
}
