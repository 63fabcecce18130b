use approx::assert_relative_eq;
use riskchart::api::{ChartEngine, ChartEngineConfig, FrameState};
use riskchart::core::{Bar, Direction, Position, PriceQuote, Viewport, ZoomDirection};
use riskchart::extensions::TradeExecution;
use riskchart::risk::{RiskRule, RiskRuleKind};

fn engine() -> ChartEngine {
    ChartEngine::new(ChartEngineConfig::new(Viewport::new(1000, 600)).with_bar_interval(60.0))
        .expect("engine")
}

fn history(count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let t = i as f64 * 60.0;
            let base = 5_150.0 + i as f64 * 0.25;
            let close = if i % 2 == 0 { base + 1.0 } else { base - 1.0 };
            let low = base.min(close) - 0.75;
            let high = base.max(close) + 0.75;
            Bar::new(t, base, high, low, close, Some(1_000.0 + i as f64)).expect("valid bar")
        })
        .collect()
}

fn es_position() -> Position {
    Position {
        id: None,
        symbol: "ESZ4".to_owned(),
        direction: Direction::Long,
        quantity: 1.0,
        avg_price: 5_168.5,
        mark_price: 5_172.0,
        multiplier: Some(50.0),
    }
}

fn trailing_rule() -> RiskRule {
    RiskRule {
        id: "trail-es".to_owned(),
        enabled: true,
        kind: RiskRuleKind::Trailing {
            trailing_distance: Some(2.0),
            trailing_percent: Some(0.01),
        },
        override_levels: None,
    }
}

#[test]
fn empty_history_yields_no_data_frame() {
    let engine = engine();
    let frame = engine.build_frame().expect("frame");

    assert_eq!(frame.state, FrameState::NoData);
    assert!(frame.candles.is_empty());
    assert!(frame.window.is_empty());
}

#[test]
fn history_without_quote_awaits_first_tick() {
    let mut engine = engine();
    engine.set_bars(history(50));

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.state, FrameState::AwaitingFirstTick);
    // Risk and display still degrade to the last close.
    assert_eq!(frame.last_price, engine.bars().last().map(|bar| bar.close));
}

#[test]
fn quote_precedence_prefers_mid_over_last() {
    let mut engine = engine();
    engine.set_bars(history(50));
    engine.on_quote(PriceQuote {
        mid: Some(5_170.25),
        last: Some(5_171.0),
        bid: Some(5_170.0),
        ask: Some(5_170.5),
        close: None,
    });

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.state, FrameState::Ready);
    assert_eq!(frame.last_price, Some(5_170.25));
}

#[test]
fn non_finite_quote_fields_are_skipped() {
    let quote = PriceQuote {
        mid: Some(f64::NAN),
        last: None,
        bid: Some(5_170.0),
        ask: None,
        close: Some(5_169.0),
    };
    assert_eq!(quote.effective_price(), Some(5_170.0));
}

#[test]
fn frame_projects_only_the_visible_window() {
    let mut engine = engine();
    engine.set_bars(history(200));
    engine.on_quote(PriceQuote::from_last(5_200.0));

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.window.len(), frame.viewport_state.visible_bars);
    assert_eq!(frame.candles.len(), frame.window.len());
    // Right edge pinned to the newest bar.
    assert_eq!(frame.window.end, 200);
    assert_eq!(frame.volume_bars.len(), frame.window.len());
    assert_eq!(frame.tick_labels.len(), 8);
}

#[test]
fn zoom_and_pan_move_the_window() {
    let mut engine = engine();
    engine.set_bars(history(400));

    let before = engine.build_frame().expect("frame").window;
    engine.zoom(ZoomDirection::In);
    let zoomed = engine.build_frame().expect("frame").window;
    assert!(zoomed.len() <= before.len());

    engine.pan_by(25);
    let panned = engine.build_frame().expect("frame").window;
    assert_eq!(panned.end, zoomed.end - 25);
}

#[test]
fn drag_pan_round_trip_keeps_offset_clamped() {
    let mut engine = engine();
    engine.set_bars(history(100));

    engine.pan_begin(500.0);
    // Way past the available history; the offset must clamp, not overflow.
    engine.pan_move(50_000.0);
    engine.pan_end();

    let state = engine.viewport_state();
    assert!(state.scroll_offset <= 100);

    engine.pan_begin(500.0);
    engine.pan_move(-50_000.0);
    engine.pan_cancel();
    assert_eq!(engine.viewport_state().scroll_offset, 0);
}

#[test]
fn markers_land_inside_the_visible_window() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_executions(vec![
        TradeExecution {
            id: Some("fill-1".to_owned()),
            time: "3010".to_owned(),
            side: "buy".to_owned(),
            price: None,
        },
        TradeExecution {
            id: None,
            time: "garbage".to_owned(),
            side: "buy".to_owned(),
            price: None,
        },
    ]);

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.markers.len(), 1);
    let marker = &frame.markers[0];
    assert!(marker.bar_index < frame.window.len());
    assert!(marker.y.is_finite());
}

#[test]
fn es_trailing_path_resolves_stop_at_5173() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_position(Some(es_position()));
    engine.set_rules(vec![trailing_rule()]);

    for price in [5_170.0, 5_175.0, 5_172.0] {
        engine.on_quote(PriceQuote::from_last(price));
    }

    let resolved = engine.resolve_risk();
    assert_eq!(resolved.len(), 1);
    let stop = resolved[0].stop_loss.expect("trailing stop");
    assert_relative_eq!(stop.price, 5_173.0, epsilon = 1e-9);
    assert!(resolved[0].take_profit.is_none());
}

#[test]
fn frame_carries_stop_and_last_price_overlays() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_position(Some(es_position()));
    engine.set_rules(vec![trailing_rule()]);
    engine.on_quote(PriceQuote::from_last(5_175.0));

    let frame = engine.build_frame().expect("frame");
    let ids: Vec<&str> = frame
        .overlays
        .iter()
        .map(|placed| placed.overlay.id.as_str())
        .collect();
    assert!(ids.contains(&"stop:trail-es"));
    assert!(ids.contains(&"last-price"));
    assert!(frame.overlays.iter().all(|placed| placed.y.is_finite()));
}

#[test]
fn overlay_drag_round_trips_through_the_rendered_scale() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_position(Some(es_position()));
    // A stop far below the bar range stretches the rendered price domain;
    // the drag inverse must use that same domain.
    engine.set_rules(vec![RiskRule {
        id: "fixed-es".to_owned(),
        enabled: true,
        kind: RiskRuleKind::Fixed {
            stop_loss_offset: None,
            take_profit_offset: None,
            stop_loss_price: Some(5_000.0),
            take_profit_price: None,
        },
        override_levels: None,
    }]);
    engine.on_quote(PriceQuote::from_last(5_172.0));

    let frame = engine.build_frame().expect("frame");
    let stop_y = frame
        .overlays
        .iter()
        .find(|placed| placed.overlay.id == "stop:fixed-es")
        .expect("stop overlay")
        .y;

    engine.overlay_drag_begin("stop:fixed-es");
    let (id, price) = engine.overlay_drag_move(stop_y).expect("active drag");
    engine.overlay_drag_end();

    // Grabbing the line without moving it reports the price it was drawn at.
    assert_eq!(id, "stop:fixed-es");
    assert_relative_eq!(price, 5_000.0, epsilon = 1e-6);
}

#[test]
fn risk_overlay_labels_carry_percent_from_avg() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_position(Some(es_position()));
    engine.set_rules(vec![trailing_rule()]);
    engine.on_quote(PriceQuote::from_last(5_175.0));

    let frame = engine.build_frame().expect("frame");
    let stop = frame
        .overlays
        .iter()
        .find(|placed| placed.overlay.id == "stop:trail-es")
        .expect("stop overlay");
    assert!(stop.overlay.label.starts_with("SL "));
    assert!(stop.overlay.label.contains('%'));
}

#[test]
fn percent_formatting_degrades_to_placeholder() {
    use riskchart::api::{PLACEHOLDER, format_percent};

    assert_eq!(format_percent(Some(1.234)), "+1.23%");
    assert_eq!(format_percent(Some(-0.5)), "-0.50%");
    assert_eq!(format_percent(Some(f64::NAN)), PLACEHOLDER);
    assert_eq!(format_percent(None), PLACEHOLDER);
}

#[test]
fn disabling_the_rule_evicts_trailing_state() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_position(Some(es_position()));
    engine.set_rules(vec![trailing_rule()]);
    engine.on_quote(PriceQuote::from_last(5_175.0));
    assert_eq!(engine.trailing_book().len(), 1);

    let mut disabled = trailing_rule();
    disabled.enabled = false;
    engine.set_rules(vec![disabled]);
    assert!(engine.trailing_book().is_empty());
}

#[test]
fn closing_the_position_evicts_trailing_state() {
    let mut engine = engine();
    engine.set_bars(history(60));
    engine.set_position(Some(es_position()));
    engine.set_rules(vec![trailing_rule()]);
    engine.on_quote(PriceQuote::from_last(5_175.0));
    assert_eq!(engine.trailing_book().len(), 1);

    engine.set_position(None);
    assert!(engine.trailing_book().is_empty());
}

#[test]
fn frame_snapshot_serializes_to_json() {
    let mut engine = engine();
    engine.set_bars(history(50));
    engine.on_quote(PriceQuote::from_last(5_160.0));

    let frame = engine.build_frame().expect("frame");
    let json = frame.snapshot_json_pretty().expect("snapshot json");
    assert!(json.contains("\"candles\""));
    assert!(json.contains("\"tick_labels\""));
}
