use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::core::Viewport;
use crate::error::{ChartError, ChartResult};

/// Tuning controls for viewport windowing, zoom, and drag-to-pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTuning {
    /// Width reserved for the price axis gutter.
    pub axis_width_px: f64,
    /// Horizontal gap between adjacent candles.
    pub candle_gap_px: f64,
    /// Multiplicative candle-width step for one zoom-in notch.
    pub zoom_in_factor: f64,
    /// Multiplicative candle-width step for one zoom-out notch.
    pub zoom_out_factor: f64,
    pub min_candle_width_px: f64,
    pub max_candle_width_px: f64,
    pub min_visible_bars: usize,
    pub max_visible_bars: usize,
    /// Pointer-pixels to bar-steps conversion multiplier for drag-to-pan.
    pub drag_sensitivity: f64,
}

impl Default for ViewportTuning {
    fn default() -> Self {
        Self {
            axis_width_px: 64.0,
            candle_gap_px: 2.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
            min_candle_width_px: 4.0,
            max_candle_width_px: 40.0,
            min_visible_bars: 40,
            max_visible_bars: 480,
            drag_sensitivity: 1.0,
        }
    }
}

impl ViewportTuning {
    pub fn validate(self) -> ChartResult<Self> {
        for (value, name) in [
            (self.axis_width_px, "axis_width_px"),
            (self.candle_gap_px, "candle_gap_px"),
            (self.drag_sensitivity, "drag_sensitivity"),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "viewport tuning `{name}` must be finite and >= 0"
                )));
            }
        }

        if !self.zoom_in_factor.is_finite() || self.zoom_in_factor <= 1.0 {
            return Err(ChartError::InvalidConfig(
                "zoom_in_factor must be finite and > 1".to_owned(),
            ));
        }
        if !self.zoom_out_factor.is_finite()
            || self.zoom_out_factor <= 0.0
            || self.zoom_out_factor >= 1.0
        {
            return Err(ChartError::InvalidConfig(
                "zoom_out_factor must be finite and within (0, 1)".to_owned(),
            ));
        }

        if !self.min_candle_width_px.is_finite()
            || self.min_candle_width_px <= 0.0
            || self.max_candle_width_px < self.min_candle_width_px
        {
            return Err(ChartError::InvalidConfig(
                "candle width clamps must satisfy 0 < min <= max".to_owned(),
            ));
        }

        if self.min_visible_bars == 0 || self.max_visible_bars < self.min_visible_bars {
            return Err(ChartError::InvalidConfig(
                "visible bar clamps must satisfy 0 < min <= max".to_owned(),
            ));
        }

        Ok(self)
    }

    /// Horizontal footprint of one bar slot.
    #[must_use]
    pub fn bar_step_px(self, candle_width_px: f64) -> f64 {
        candle_width_px + self.candle_gap_px
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomDirection {
    In,
    Out,
}

/// The mutable windowing state of the chart, threaded through pure transitions.
///
/// `scroll_offset` counts bars back from the newest bar; zero keeps the
/// right edge pinned to the latest data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub candle_width_px: f64,
    pub scroll_offset: usize,
    pub visible_bars: usize,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            candle_width_px: 9.0,
            scroll_offset: 0,
            visible_bars: ViewportTuning::default().min_visible_bars,
        }
    }
}

/// Half-open visible index range into the full bar history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
}

impl VisibleWindow {
    #[must_use]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.end == self.start
    }
}

/// How many bars fit in the pane at the given candle width, clamped to the
/// tuning's visible-bar range.
#[must_use]
pub fn visible_bar_capacity(viewport: Viewport, candle_width_px: f64, tuning: ViewportTuning) -> usize {
    let pane_width = f64::from(viewport.width) - tuning.axis_width_px;
    let step = tuning.bar_step_px(candle_width_px);
    let raw = if pane_width > 0.0 && step > 0.0 {
        (pane_width / step).floor() as usize
    } else {
        0
    };
    raw.clamp(tuning.min_visible_bars, tuning.max_visible_bars)
}

/// Recomputes the visible bar count after a container resize or candle-width
/// change. Missing layout measurements leave the state untouched.
#[must_use]
pub fn resize(state: ViewportState, viewport: Viewport, tuning: ViewportTuning) -> ViewportState {
    if !viewport.is_valid() || f64::from(viewport.width) <= tuning.axis_width_px {
        warn!(
            width = viewport.width,
            height = viewport.height,
            "viewport measurements missing, keeping previous window"
        );
        return state;
    }

    ViewportState {
        visible_bars: visible_bar_capacity(viewport, state.candle_width_px, tuning),
        ..state
    }
}

/// Applies one zoom notch: scales the candle width within its clamps and
/// refits the visible bar count to the container.
#[must_use]
pub fn zoom(
    state: ViewportState,
    direction: ZoomDirection,
    viewport: Viewport,
    tuning: ViewportTuning,
) -> ViewportState {
    let factor = match direction {
        ZoomDirection::In => tuning.zoom_in_factor,
        ZoomDirection::Out => tuning.zoom_out_factor,
    };
    let candle_width_px = (state.candle_width_px * factor)
        .clamp(tuning.min_candle_width_px, tuning.max_candle_width_px);

    resize(
        ViewportState {
            candle_width_px,
            ..state
        },
        viewport,
        tuning,
    )
}

/// Pans by a signed bar delta, clamping the scroll offset to
/// `[0, max(0, total_bars - visible_bars)]`.
#[must_use]
pub fn pan(state: ViewportState, delta_bars: i64, total_bars: usize) -> ViewportState {
    let max_offset = total_bars.saturating_sub(state.visible_bars) as i64;
    let next = (state.scroll_offset as i64 + delta_bars).clamp(0, max_offset);
    trace!(delta_bars, scroll_offset = next, "viewport pan");
    ViewportState {
        scroll_offset: next as usize,
        ..state
    }
}

/// Resolves the visible index window into a history of `total_bars` bars.
#[must_use]
pub fn visible_window(state: ViewportState, total_bars: usize) -> VisibleWindow {
    let max_offset = total_bars.saturating_sub(state.visible_bars);
    let scroll = state.scroll_offset.min(max_offset);
    let start = total_bars.saturating_sub(state.visible_bars + scroll);
    let end = (start + state.visible_bars).min(total_bars);
    VisibleWindow { start, end }
}

/// Drag-to-pan gesture state.
///
/// Mirrors the browser pattern of transient global move/up listeners: the
/// gesture is armed by `begin`, fed pointer positions by `update`, and must
/// be cleared on every exit path (`end` and `cancel` both clear it).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanGesture {
    active: bool,
    last_x: f64,
    residual_px: f64,
}

impl PanGesture {
    #[must_use]
    pub fn is_active(self) -> bool {
        self.active
    }

    pub fn begin(&mut self, pointer_x: f64) {
        self.active = true;
        self.last_x = pointer_x;
        self.residual_px = 0.0;
    }

    /// Converts pointer movement into whole bar-steps to pan, carrying the
    /// sub-step remainder across events. Positive pointer deltas (drag right)
    /// scroll back into history.
    pub fn update(
        &mut self,
        pointer_x: f64,
        candle_width_px: f64,
        tuning: ViewportTuning,
    ) -> i64 {
        if !self.active || !pointer_x.is_finite() {
            return 0;
        }

        self.residual_px += (pointer_x - self.last_x) * tuning.drag_sensitivity;
        self.last_x = pointer_x;

        let step = tuning.bar_step_px(candle_width_px);
        if step <= 0.0 {
            return 0;
        }

        let bars = (self.residual_px / step).trunc();
        self.residual_px -= bars * step;
        bars as i64
    }

    pub fn end(&mut self) {
        *self = Self::default();
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}
