use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use scatter_grid::aggregation::{
    BUY_COLOR, SELL_COLOR, TradeRecord, bucket_by_minute, minute_volume_panel, panel_from_trades,
};
use scatter_grid::api::{ScatterGridConfig, ScatterGridEngine};
use scatter_grid::core::TradeSide;
use scatter_grid::render::HeadlessBackend;

fn trades() -> Vec<TradeRecord> {
    (0u32..12)
        .map(|i| TradeRecord {
            time: Utc
                .with_ymd_and_hms(2024, 3, 1, 9, i / 4, (i * 7) % 60)
                .single()
                .expect("valid time"),
            price: Decimal::new(10_000 + i64::from(i) * 25, 2),
            size: Decimal::from(1 + i64::from(i % 3)),
            side: if i % 2 == 0 {
                TradeSide::Buy
            } else {
                TradeSide::Sell
            },
        })
        .collect()
}

#[test]
fn trades_flow_into_rendered_panels_with_side_colors() {
    let trades = trades();
    let raw = panel_from_trades("raw", "Trades", &trades).expect("raw panel");
    let minutes = minute_volume_panel("min", "Per minute", &trades).expect("minute panel");
    assert_eq!(bucket_by_minute(&trades).expect("buckets").len(), 3);
    assert_eq!(minutes.points.len(), 3);

    let mut engine = ScatterGridEngine::new(
        HeadlessBackend::new(),
        ScatterGridConfig::default().with_columns(2),
        620.0,
    )
    .expect("engine init");
    engine.set_panels(vec![raw, minutes]).expect("panels");
    assert!(engine.render_if_invalidated().expect("render"));

    let frame = engine.backend().last_frame().expect("frame");
    assert_eq!(frame.draws.len(), 2);
    assert_eq!(frame.draws[0].point_count, 12);
    assert_eq!(&frame.draws[0].colors[0..3], &BUY_COLOR.to_array());
    assert_eq!(&frame.draws[0].colors[3..6], &SELL_COLOR.to_array());
    assert_eq!(frame.draws[0].viewport, frame.draws[0].scissor);
}
