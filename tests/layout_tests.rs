use scatter_grid::core::{GridLayout, GridLayoutConfig};

fn config(columns: u32) -> GridLayoutConfig {
    GridLayoutConfig {
        columns,
        cell_height: 280.0,
        gap: 20.0,
        bottom_margin: 24.0,
    }
}

#[test]
fn rows_round_up_and_total_height_includes_margin() {
    let layout = GridLayout::compute(7, config(3), 640.0).expect("layout");
    assert_eq!(layout.rows(), 3);
    assert_eq!(layout.cell_width(), 200.0);
    assert_eq!(layout.total_height(), 3.0 * 280.0 + 2.0 * 20.0 + 24.0);
}

#[test]
fn pointer_in_third_column_second_row_hits_panel_eight() {
    // 6 columns of 200px with 20px gaps.
    let layout = GridLayout::compute(12, config(6), 1300.0).expect("layout");
    assert_eq!(layout.cell_width(), 200.0);

    let hit = layout.cell_at(2.0 * 220.0 + 50.0, 300.0 + 50.0).expect("hit");
    assert_eq!(hit.column, 2);
    assert_eq!(hit.row, 1);
    assert_eq!(hit.index, 8);
    assert_eq!(hit.local_x, 50.0);
    assert_eq!(hit.local_y, 50.0);
}

#[test]
fn cell_rects_follow_column_major_stride() {
    let layout = GridLayout::compute(5, config(2), 420.0).expect("layout");
    let rect = layout.cell_rect(3).expect("cell 3");
    assert_eq!(rect.x, 220.0);
    assert_eq!(rect.y, 300.0);
    assert_eq!(rect.width, 200.0);
    assert_eq!(rect.height, 280.0);
    assert!(layout.cell_rect(5).is_none());
}

#[test]
fn backing_size_scales_with_device_pixel_ratio() {
    let layout = GridLayout::compute(3, config(3), 640.0).expect("layout");
    assert_eq!(layout.backing_size(1.0), (640, 304));
    assert_eq!(layout.backing_size(2.0), (1280, 608));
}

#[test]
fn pointer_past_last_panel_misses() {
    let layout = GridLayout::compute(4, config(3), 640.0).expect("layout");
    // Row 1 has only one panel.
    assert!(layout.cell_at(250.0, 350.0).is_none());
    assert_eq!(layout.cell_at(50.0, 350.0).map(|hit| hit.index), Some(3));
}

#[test]
fn invalid_inputs_are_rejected() {
    assert!(GridLayout::compute(1, config(0), 640.0).is_err());
    let mut bad_height = config(3);
    bad_height.cell_height = 0.0;
    assert!(GridLayout::compute(1, bad_height, 640.0).is_err());
    let mut bad_gap = config(3);
    bad_gap.gap = -1.0;
    assert!(GridLayout::compute(1, bad_gap, 640.0).is_err());
    assert!(GridLayout::compute(1, config(3), f64::NAN).is_err());
}
