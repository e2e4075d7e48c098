use approx::assert_relative_eq;
use scatter_grid::api::{InvalidationTopic, ScatterGridConfig, ScatterGridEngine};
use scatter_grid::core::{Panel, Point};
use scatter_grid::extensions::{MarkerOverlayStyle, PanelMarker};
use scatter_grid::render::HeadlessBackend;

fn engine() -> ScatterGridEngine<HeadlessBackend> {
    let config = ScatterGridConfig::default()
        .with_columns(2)
        .with_cell_height(200.0)
        .with_gap(10.0);
    let mut engine =
        ScatterGridEngine::new(HeadlessBackend::new(), config, 410.0).expect("engine init");
    engine
        .set_panels(vec![
            Panel::new("a", "A").with_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]),
            Panel::new("b", "B").with_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]),
        ])
        .expect("panels");
    engine
}

#[test]
fn marker_crosshair_sits_on_the_point_it_marks() {
    let mut engine = engine();
    engine.render().expect("render");
    engine
        .set_markers("b", vec![PanelMarker::new(10.0, 10.0).with_label("fill")])
        .expect("markers");
    assert!(engine.pending_invalidation().contains(InvalidationTopic::Overlay));

    let overlay = engine
        .marker_overlay(MarkerOverlayStyle::default())
        .expect("overlay");
    assert_eq!(overlay.lines.len(), 2);
    assert_eq!(overlay.labels.len(), 1);

    let cell = engine.layout().cell_rect(1).expect("cell");
    let (local_x, local_y) =
        engine.prepared_panels()[1].data_to_cell_pixel(10.0, 10.0, cell.width, cell.height);
    let horizontal = overlay.lines[0];
    let vertical = overlay.lines[1];
    assert_relative_eq!(horizontal.y1, cell.y + local_y, epsilon = 1e-9);
    assert_relative_eq!(horizontal.y2, cell.y + local_y, epsilon = 1e-9);
    assert_relative_eq!(vertical.x1, cell.x + local_x, epsilon = 1e-9);
    assert!(horizontal.x1 >= cell.x && horizontal.x2 <= cell.x + cell.width);
    assert_eq!(overlay.labels[0].text, "fill");
}

#[test]
fn markers_outside_the_panel_range_are_skipped() {
    let mut engine = engine();
    engine
        .set_markers(
            "a",
            vec![
                PanelMarker::new(500.0, 5.0),
                PanelMarker::new(5.0, -100.0),
                PanelMarker::new(f64::NAN, 5.0),
            ],
        )
        .expect("markers");
    let overlay = engine
        .marker_overlay(MarkerOverlayStyle::default())
        .expect("overlay");
    assert!(overlay.is_empty());
}

#[test]
fn clearing_markers_empties_the_overlay() {
    let mut engine = engine();
    engine
        .set_markers("a", vec![PanelMarker::new(5.0, 5.0)])
        .expect("markers");
    assert_eq!(engine.markers_for("a").len(), 1);
    engine.clear_markers();
    assert!(engine.markers_for("a").is_empty());
    assert!(
        engine
            .marker_overlay(MarkerOverlayStyle::default())
            .expect("overlay")
            .is_empty()
    );
}
