use std::sync::Arc;

use approx::assert_relative_eq;
use scatter_grid::core::{
    GridLayout, GridLayoutConfig, NormalizerConfig, Panel, Point, PreparedPanel, TradeSide,
    prepare_panel,
};
use scatter_grid::interaction::{HIT_TOLERANCE_FRACTION, hit_test, resolve_pointer};

fn layout(panel_count: usize) -> GridLayout {
    GridLayout::compute(
        panel_count,
        GridLayoutConfig {
            columns: 2,
            cell_height: 200.0,
            gap: 10.0,
            bottom_margin: 20.0,
        },
        410.0,
    )
    .expect("layout")
}

fn prepared(panel: Panel) -> Arc<PreparedPanel> {
    Arc::new(prepare_panel(Arc::new(panel), &NormalizerConfig::default()))
}

fn pixel_of(
    layout: &GridLayout,
    index: usize,
    panel: &PreparedPanel,
    time: f64,
    price: f64,
) -> (f64, f64) {
    let cell = layout.cell_rect(index).expect("cell");
    let (local_x, local_y) = panel.data_to_cell_pixel(time, price, cell.width, cell.height);
    (cell.x + local_x, cell.y + local_y)
}

#[test]
fn hovering_a_point_reports_it_with_its_side() {
    let panels = vec![
        prepared(Panel::new("a", "A").with_points(vec![Point::new(0.0, 1.0)])),
        prepared(Panel::new("b", "B").with_points(vec![
            Point::new(0.0, 10.0).with_size(3.0).with_side(TradeSide::Buy),
            Point::new(100.0, 20.0).with_side(TradeSide::Sell),
        ])),
    ];
    let layout = layout(panels.len());
    let (x, y) = pixel_of(&layout, 1, &panels[1], 100.0, 20.0);

    let tooltip = hit_test(&layout, &panels, x, y);
    assert!(tooltip.visible);
    assert_eq!(tooltip.panel_index, Some(1));
    assert_eq!(tooltip.panel_id.as_deref(), Some("b"));
    assert_eq!(tooltip.points.len(), 1);
    assert_eq!(tooltip.points[0].price, 20.0);
    assert_eq!(tooltip.points[0].time, 100.0);
    assert_eq!(tooltip.points[0].size, 1.0);
    assert_eq!(tooltip.points[0].side, Some(TradeSide::Sell));
    assert_eq!((tooltip.screen_x, tooltip.screen_y), (x, y));
}

#[test]
fn higher_prices_sit_higher_on_screen() {
    let panel = prepared(
        Panel::new("a", "A").with_points(vec![Point::new(0.0, 1.0), Point::new(1.0, 2.0)]),
    );
    let layout = layout(1);
    let (_, low_y) = pixel_of(&layout, 0, &panel, 0.0, 1.0);
    let (_, high_y) = pixel_of(&layout, 0, &panel, 1.0, 2.0);
    assert!(high_y < low_y);
}

#[test]
fn overlapping_points_are_all_reported_in_original_order() {
    let panel = prepared(Panel::new("a", "A").with_points(vec![
        Point::new(50.0, 5.0).with_size(2.0),
        Point::new(0.0, 0.0),
        Point::new(50.0, 5.0).with_size(7.0),
        Point::new(100.0, 10.0),
    ]));
    let layout = layout(1);
    let panels = vec![Arc::clone(&panel)];
    let (x, y) = pixel_of(&layout, 0, &panel, 50.0, 5.0);

    let tooltip = hit_test(&layout, &panels, x, y);
    let sizes: Vec<f64> = tooltip.points.iter().map(|point| point.size).collect();
    assert_eq!(sizes, vec![2.0, 7.0]);
}

#[test]
fn tolerance_window_scales_with_padded_span() {
    let panel = prepared(
        Panel::new("a", "A").with_points(vec![Point::new(0.0, 0.0), Point::new(100.0, 50.0)]),
    );
    let layout = layout(1);
    let panels = vec![Arc::clone(&panel)];
    let (x, y) = pixel_of(&layout, 0, &panel, 50.0, 25.0);

    let query = resolve_pointer(&layout, &panels, x, y).expect("query");
    assert_relative_eq!(query.time, 50.0, epsilon = 1e-9);
    assert_relative_eq!(query.price, 25.0, epsilon = 1e-9);
    assert_relative_eq!(query.time_tolerance, 110.0 * HIT_TOLERANCE_FRACTION, epsilon = 1e-9);
    assert_relative_eq!(query.price_tolerance, 55.0 * HIT_TOLERANCE_FRACTION, epsilon = 1e-9);
    assert!(!hit_test(&layout, &panels, x, y).visible);
}

#[test]
fn empty_panel_and_gap_never_hit() {
    let panels = vec![
        prepared(Panel::new("empty", "Empty")),
        prepared(Panel::new("b", "B").with_points(vec![Point::new(0.0, 1.0)])),
    ];
    let layout = layout(panels.len());
    for (x, y) in [(100.0, 100.0), (102.0, 102.0), (0.0, 0.0), (200.0, 200.0)] {
        assert!(!hit_test(&layout, &panels, x, y).visible);
    }
    // Gap between the two cells.
    assert!(resolve_pointer(&layout, &panels, 205.0, 100.0).is_none());
    // Below the last row, inside the bottom margin.
    assert!(resolve_pointer(&layout, &panels, 300.0, 210.0).is_none());
}

#[test]
fn pointer_in_label_margin_clamps_to_panel_edge() {
    let panel = prepared(
        Panel::new("a", "A").with_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]),
    );
    let layout = layout(1);
    let panels = vec![Arc::clone(&panel)];

    let query = resolve_pointer(&layout, &panels, 1.0, 1.0).expect("query");
    let bounds = panel.bounds();
    assert_relative_eq!(query.time, bounds.xmin(), epsilon = 1e-12);
    assert_relative_eq!(query.price, bounds.ymax(), epsilon = 1e-12);
}
