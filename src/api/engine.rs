use ordered_float::OrderedFloat;
use tracing::debug;

use crate::api::frame::{
    FrameState, MarkerGlyph, RenderFrame, TickLabel, format_percent, format_price, format_signed,
};
use crate::core::{
    Bar, PanGesture, Position, PriceQuote, PriceScale, PriceScaleTuning, Viewport, ViewportState,
    ViewportTuning, ZoomDirection, project_candles, project_volume_bars, viewport,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{
    OverlayDrag, OverlayLayoutTuning, PriceOverlay, TradeExecution, align_markers,
    layout_overlay_labels,
};
use crate::risk::{
    ResolvedRiskLevels, RiskRule, RiskRuleKind, TrailKey, TrailingBook, resolve_risk_levels,
};

/// Construction-time configuration for the engine facade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartEngineConfig {
    pub viewport: Viewport,
    /// Explicit bar interval in seconds; inferred from data when absent.
    pub bar_interval: Option<f64>,
    pub price_decimals: usize,
    pub viewport_tuning: ViewportTuning,
    pub price_tuning: PriceScaleTuning,
    pub overlay_tuning: OverlayLayoutTuning,
}

impl ChartEngineConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            bar_interval: None,
            price_decimals: 2,
            viewport_tuning: ViewportTuning::default(),
            price_tuning: PriceScaleTuning::default(),
            overlay_tuning: OverlayLayoutTuning::default(),
        }
    }

    #[must_use]
    pub fn with_bar_interval(mut self, seconds: f64) -> Self {
        self.bar_interval = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_price_decimals(mut self, decimals: usize) -> Self {
        self.price_decimals = decimals;
        self
    }
}

/// Main orchestration facade consumed by host dashboards.
///
/// `ChartEngine` owns the bar history, viewport state, execution markers,
/// risk rules, trailing book, and the latest quote, and turns them into a
/// `RenderFrame` of pixel-space primitives per render pass. Everything is
/// synchronous; a superseded computation is simply discarded by the next one.
pub struct ChartEngine {
    config: ChartEngineConfig,
    container: Viewport,
    bars: Vec<Bar>,
    executions: Vec<TradeExecution>,
    extra_overlays: Vec<PriceOverlay>,
    position: Option<Position>,
    rules: Vec<RiskRule>,
    trailing: TrailingBook,
    quote: PriceQuote,
    viewport_state: ViewportState,
    pan_gesture: PanGesture,
    overlay_drag: OverlayDrag,
}

impl ChartEngine {
    pub fn new(config: ChartEngineConfig) -> ChartResult<Self> {
        if !config.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: config.viewport.width,
                height: config.viewport.height,
            });
        }
        let viewport_tuning = config.viewport_tuning.validate()?;
        config.price_tuning.validate()?;
        config.overlay_tuning.validate()?;

        let viewport_state =
            viewport::resize(ViewportState::default(), config.viewport, viewport_tuning);

        Ok(Self {
            config,
            container: config.viewport,
            bars: Vec::new(),
            executions: Vec::new(),
            extra_overlays: Vec::new(),
            position: None,
            rules: Vec::new(),
            trailing: TrailingBook::new(),
            quote: PriceQuote::default(),
            viewport_state,
            pan_gesture: PanGesture::default(),
            overlay_drag: OverlayDrag::default(),
        })
    }

    // ---- data inputs -----------------------------------------------------

    /// Replaces the bar history. Bars are kept in ascending time order.
    pub fn set_bars(&mut self, mut bars: Vec<Bar>) {
        bars.sort_by_key(|bar| OrderedFloat(bar.time));
        self.bars = bars;
    }

    pub fn append_bar(&mut self, bar: Bar) {
        match self.bars.last() {
            Some(last) if bar.time < last.time => {
                debug!(time = bar.time, "out-of-order bar, re-sorting history");
                self.bars.push(bar);
                self.bars.sort_by_key(|bar| OrderedFloat(bar.time));
            }
            _ => self.bars.push(bar),
        }
    }

    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn set_executions(&mut self, executions: Vec<TradeExecution>) {
        self.executions = executions;
    }

    pub fn push_execution(&mut self, execution: TradeExecution) {
        self.executions.push(execution);
    }

    /// Extra host-supplied overlays, merged with the derived risk overlays.
    pub fn set_overlays(&mut self, overlays: Vec<PriceOverlay>) {
        self.extra_overlays = overlays;
    }

    pub fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
        self.evict_stale_trailing();
    }

    pub fn set_rules(&mut self, rules: Vec<RiskRule>) {
        self.rules = rules;
        self.evict_stale_trailing();
    }

    /// Ingests a live quote and advances the trailing book for every active
    /// trailing-type rule.
    pub fn on_quote(&mut self, quote: PriceQuote) {
        self.quote = quote;

        let Some(price) = quote.effective_price() else {
            return;
        };
        let Some(position) = self.position.clone() else {
            return;
        };

        for rule in &self.rules {
            if !rule.enabled || !is_trailing_kind(&rule.kind) {
                continue;
            }
            let key = TrailKey::new(rule.id.clone(), position.key(), position.direction);
            self.trailing.observe(&key, position.avg_price, price);
        }
    }

    #[must_use]
    pub fn trailing_book(&self) -> &TrailingBook {
        &self.trailing
    }

    /// Effective display price: live quote first, last close as fallback.
    #[must_use]
    pub fn last_price(&self) -> Option<f64> {
        self.quote
            .effective_price()
            .or_else(|| self.bars.last().map(|bar| bar.close))
    }

    // ---- viewport --------------------------------------------------------

    #[must_use]
    pub fn viewport_state(&self) -> ViewportState {
        self.viewport_state
    }

    pub fn on_resize(&mut self, container: Viewport) {
        self.container = container;
        self.viewport_state =
            viewport::resize(self.viewport_state, container, self.config.viewport_tuning);
    }

    pub fn zoom(&mut self, direction: ZoomDirection) {
        self.viewport_state = viewport::zoom(
            self.viewport_state,
            direction,
            self.container,
            self.config.viewport_tuning,
        );
    }

    pub fn pan_by(&mut self, delta_bars: i64) {
        self.viewport_state = viewport::pan(self.viewport_state, delta_bars, self.bars.len());
    }

    pub fn pan_begin(&mut self, pointer_x: f64) {
        self.pan_gesture.begin(pointer_x);
    }

    pub fn pan_move(&mut self, pointer_x: f64) {
        let delta = self.pan_gesture.update(
            pointer_x,
            self.viewport_state.candle_width_px,
            self.config.viewport_tuning,
        );
        if delta != 0 {
            self.pan_by(delta);
        }
    }

    pub fn pan_end(&mut self) {
        self.pan_gesture.end();
    }

    pub fn pan_cancel(&mut self) {
        self.pan_gesture.cancel();
    }

    // ---- overlay dragging ------------------------------------------------

    pub fn overlay_drag_begin(&mut self, overlay_id: impl Into<String>) {
        self.overlay_drag.begin(overlay_id);
    }

    /// Maps the pointer's pane Y to the dragged overlay's new price.
    ///
    /// The engine does not mutate rule configuration; the host applies the
    /// returned price to whatever owns the dragged level.
    #[must_use]
    pub fn overlay_drag_move(&mut self, pointer_y: f64) -> Option<(String, f64)> {
        let scale = self.current_price_scale().ok()?;
        self.overlay_drag
            .update(pointer_y, scale, self.pane_height())
            .map(|(id, price)| (id.to_owned(), price))
    }

    pub fn overlay_drag_end(&mut self) {
        self.overlay_drag.end();
    }

    pub fn overlay_drag_cancel(&mut self) {
        self.overlay_drag.cancel();
    }

    // ---- risk ------------------------------------------------------------

    /// Resolves stop/target levels for every enabled rule against the
    /// current position, quote, and trailing state.
    #[must_use]
    pub fn resolve_risk(&self) -> Vec<ResolvedRiskLevels> {
        let Some(position) = self.position.as_ref() else {
            return Vec::new();
        };
        let latest = self.last_price();

        self.rules
            .iter()
            .filter_map(|rule| {
                let key = TrailKey::new(rule.id.clone(), position.key(), position.direction);
                resolve_risk_levels(rule, position, latest, self.trailing.snapshot(&key))
            })
            .collect()
    }

    // ---- frame -----------------------------------------------------------

    /// Builds the drawing primitives for one render pass.
    pub fn build_frame(&self) -> ChartResult<RenderFrame> {
        if self.bars.is_empty() {
            return Ok(RenderFrame::degraded(
                FrameState::NoData,
                self.viewport_state,
            ));
        }

        let state = if self.quote.effective_price().is_some() {
            FrameState::Ready
        } else {
            FrameState::AwaitingFirstTick
        };

        let window = viewport::visible_window(self.viewport_state, self.bars.len());
        let visible = &self.bars[window.start..window.end];
        let pane_height = self.pane_height();
        let last_price = self.last_price();
        let risk = self.resolve_risk();
        let overlays = self.build_overlays(&risk, last_price);

        let scale = self.price_scale_for(visible, &overlays)?;

        let tuning = self.config.viewport_tuning;
        let candle_width = self.viewport_state.candle_width_px;
        let candles = project_candles(visible, scale, pane_height, candle_width, tuning)?;
        let volume_bars = project_volume_bars(visible, pane_height, candle_width, tuning);

        let tick_labels = scale
            .ticks()
            .into_iter()
            .map(|price| TickLabel {
                price,
                y: scale.price_to_pixel(price, pane_height),
                text: format_price(price, self.config.price_decimals),
            })
            .collect();

        let markers = align_markers(&self.executions, visible, self.config.bar_interval)
            .into_iter()
            .map(|marker| MarkerGlyph {
                x: (marker.bar_index as f64 + 0.5) * tuning.bar_step_px(candle_width),
                y: scale.price_to_pixel(marker.price, pane_height),
                id: marker.id,
                bar_index: marker.bar_index,
                side: marker.side,
            })
            .collect();

        let overlays =
            layout_overlay_labels(&overlays, scale, pane_height, self.config.overlay_tuning);

        Ok(RenderFrame {
            state,
            viewport_state: self.viewport_state,
            window,
            pane_height,
            candles,
            volume_bars,
            tick_labels,
            overlays,
            markers,
            risk,
            last_price,
        })
    }

    // ---- internals -------------------------------------------------------

    fn pane_height(&self) -> f64 {
        f64::from(self.container.height)
    }

    /// Price domain shared by rendering and drag inversion. Overlay prices
    /// participate in the span, so a line outside the bar range still maps
    /// back to the price it was drawn at.
    fn price_scale_for(&self, visible: &[Bar], overlays: &[PriceOverlay]) -> ChartResult<PriceScale> {
        let levels: Vec<f64> = overlays.iter().map(|overlay| overlay.price).collect();
        PriceScale::from_visible_bars(visible, &levels, self.config.price_tuning)
    }

    fn current_price_scale(&self) -> ChartResult<PriceScale> {
        let window = viewport::visible_window(self.viewport_state, self.bars.len());
        let visible = &self.bars[window.start..window.end];
        let risk = self.resolve_risk();
        let overlays = self.build_overlays(&risk, self.last_price());
        self.price_scale_for(visible, &overlays)
    }

    /// Rebuilds the derived overlay set: one line per resolved stop/target
    /// plus the live price line and any host-supplied overlays.
    fn build_overlays(
        &self,
        risk: &[ResolvedRiskLevels],
        last_price: Option<f64>,
    ) -> Vec<PriceOverlay> {
        let decimals = self.config.price_decimals;
        let mut overlays = Vec::new();

        for resolved in risk {
            if let Some(stop) = resolved.stop_loss {
                overlays.push(
                    PriceOverlay::new(
                        format!("stop:{}", resolved.rule_id),
                        stop.price,
                        format!(
                            "SL {} ({} / {})",
                            format_price(stop.price, decimals),
                            format_signed(stop.delta_from_avg, decimals),
                            format_percent(stop.percent_from_avg)
                        ),
                    )
                    .with_color("#ef5350")
                    .dashed()
                    .draggable(),
                );
            }
            if let Some(target) = resolved.take_profit {
                overlays.push(
                    PriceOverlay::new(
                        format!("target:{}", resolved.rule_id),
                        target.price,
                        format!(
                            "TP {} ({} / {})",
                            format_price(target.price, decimals),
                            format_signed(target.delta_from_avg, decimals),
                            format_percent(target.percent_from_avg)
                        ),
                    )
                    .with_color("#26a69a")
                    .dashed()
                    .draggable(),
                );
            }
        }

        if let Some(price) = last_price.filter(|price| price.is_finite()) {
            overlays.push(
                PriceOverlay::new("last-price", price, format_price(price, decimals))
                    .with_color("#2962ff"),
            );
        }

        overlays.extend(self.extra_overlays.iter().cloned());
        overlays
    }

    /// Drops trailing snapshots whose rule or position is gone, disabled, or
    /// flipped direction.
    fn evict_stale_trailing(&mut self) {
        let position = self.position.clone();
        let rules = self.rules.clone();
        self.trailing.retain_active(|key| {
            let Some(position) = position.as_ref() else {
                return false;
            };
            if key.position_key != position.key() || key.direction != position.direction {
                return false;
            }
            rules.iter().any(|rule| {
                rule.id == key.rule_id && rule.enabled && is_trailing_kind(&rule.kind)
            })
        });
    }
}

fn is_trailing_kind(kind: &RiskRuleKind) -> bool {
    matches!(
        kind,
        RiskRuleKind::Trailing { .. } | RiskRuleKind::AtrTrailing { .. }
    )
}
