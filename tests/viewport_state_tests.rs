use riskchart::core::{
    PanGesture, Viewport, ViewportState, ViewportTuning, ZoomDirection, pan, resize,
    visible_bar_capacity, visible_window, zoom,
};

fn state(candle_width_px: f64, scroll_offset: usize, visible_bars: usize) -> ViewportState {
    ViewportState {
        candle_width_px,
        scroll_offset,
        visible_bars,
    }
}

#[test]
fn capacity_counts_bar_slots_in_pane_width() {
    let tuning = ViewportTuning::default();
    // (1000 - 64) / (9 + 2) = 85.09
    let capacity = visible_bar_capacity(Viewport::new(1000, 600), 9.0, tuning);
    assert_eq!(capacity, 85);
}

#[test]
fn capacity_is_clamped_to_bar_range() {
    let tuning = ViewportTuning::default();

    let narrow = visible_bar_capacity(Viewport::new(100, 600), 40.0, tuning);
    assert_eq!(narrow, tuning.min_visible_bars);

    let wide = visible_bar_capacity(Viewport::new(10_000, 600), 4.0, tuning);
    assert_eq!(wide, tuning.max_visible_bars);
}

#[test]
fn resize_without_measurements_is_a_no_op() {
    let tuning = ViewportTuning::default();
    let before = state(9.0, 12, 85);

    assert_eq!(resize(before, Viewport::new(0, 0), tuning), before);
    assert_eq!(resize(before, Viewport::new(40, 600), tuning), before);
}

#[test]
fn zoom_in_widens_candles_and_shrinks_window() {
    let tuning = ViewportTuning::default();
    let viewport = Viewport::new(1000, 600);
    let before = resize(state(9.0, 0, 0), viewport, tuning);

    let after = zoom(before, ZoomDirection::In, viewport, tuning);
    assert!((after.candle_width_px - 9.9).abs() < 1e-9);
    assert!(after.visible_bars <= before.visible_bars);
}

#[test]
fn zoom_clamps_candle_width() {
    let tuning = ViewportTuning::default();
    let viewport = Viewport::new(1000, 600);

    let mut narrow = state(4.0, 0, 85);
    narrow = zoom(narrow, ZoomDirection::Out, viewport, tuning);
    assert_eq!(narrow.candle_width_px, tuning.min_candle_width_px);

    let mut wide = state(40.0, 0, 85);
    wide = zoom(wide, ZoomDirection::In, viewport, tuning);
    assert_eq!(wide.candle_width_px, tuning.max_candle_width_px);
}

#[test]
fn pan_clamps_scroll_offset() {
    let before = state(9.0, 0, 80);

    let back = pan(before, 1_000, 200);
    assert_eq!(back.scroll_offset, 120);

    let forward = pan(back, -10_000, 200);
    assert_eq!(forward.scroll_offset, 0);
}

#[test]
fn pan_with_fewer_bars_than_window_stays_pinned() {
    let before = state(9.0, 5, 80);
    let after = pan(before, 3, 50);
    assert_eq!(after.scroll_offset, 0);
}

#[test]
fn visible_window_pins_right_edge_at_zero_scroll() {
    let window = visible_window(state(9.0, 0, 80), 200);
    assert_eq!(window.start, 120);
    assert_eq!(window.end, 200);
}

#[test]
fn visible_window_scrolls_back_into_history() {
    let window = visible_window(state(9.0, 30, 80), 200);
    assert_eq!(window.start, 90);
    assert_eq!(window.end, 170);
}

#[test]
fn visible_window_covers_short_history() {
    let window = visible_window(state(9.0, 0, 80), 12);
    assert_eq!(window.start, 0);
    assert_eq!(window.end, 12);
    assert_eq!(window.len(), 12);
}

#[test]
fn pan_gesture_emits_whole_bar_steps_and_keeps_remainder() {
    let tuning = ViewportTuning::default();
    let mut gesture = PanGesture::default();
    gesture.begin(100.0);

    // One bar step is 9 + 2 = 11 px.
    assert_eq!(gesture.update(106.0, 9.0, tuning), 0);
    assert_eq!(gesture.update(112.0, 9.0, tuning), 1);
    // Residual is 1 px; moving 22 px left accumulates -21 px -> one whole step.
    assert_eq!(gesture.update(90.0, 9.0, tuning), -1);
}

#[test]
fn pan_gesture_clears_on_every_exit_path() {
    let tuning = ViewportTuning::default();

    let mut gesture = PanGesture::default();
    gesture.begin(0.0);
    gesture.end();
    assert!(!gesture.is_active());
    assert_eq!(gesture.update(500.0, 9.0, tuning), 0);

    gesture.begin(0.0);
    gesture.cancel();
    assert!(!gesture.is_active());
    assert_eq!(gesture.update(500.0, 9.0, tuning), 0);
}
