use serde::{Deserialize, Serialize};

use crate::core::{CandleGeometry, ViewportState, VisibleWindow, VolumeBarGeometry};
use crate::error::ChartResult;
use crate::extensions::{PlacedOverlay, TradeSide};
use crate::risk::ResolvedRiskLevels;

/// Placeholder shown wherever a numeric display value is missing.
pub const PLACEHOLDER: &str = "—";

/// Overall readiness of a frame, surfaced instead of exceptions when the
/// upstream feed has not produced enough data yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameState {
    Ready,
    /// No bar history at all.
    NoData,
    /// Bar history exists but no live quote has arrived yet.
    AwaitingFirstTick,
}

/// One price-axis gridline with its formatted label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickLabel {
    pub price: f64,
    pub y: f64,
    pub text: String,
}

/// One trade-execution glyph anchored to a visible bar slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerGlyph {
    pub id: Option<String>,
    pub bar_index: usize,
    pub x: f64,
    pub y: f64,
    pub side: TradeSide,
}

/// Pixel-space drawing primitives for one render pass.
///
/// The host UI draws these directly; no renderer backend lives in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub state: FrameState,
    pub viewport_state: ViewportState,
    pub window: VisibleWindow,
    pub pane_height: f64,
    pub candles: Vec<CandleGeometry>,
    pub volume_bars: Vec<VolumeBarGeometry>,
    pub tick_labels: Vec<TickLabel>,
    pub overlays: Vec<PlacedOverlay>,
    pub markers: Vec<MarkerGlyph>,
    pub risk: Vec<ResolvedRiskLevels>,
    pub last_price: Option<f64>,
}

impl RenderFrame {
    /// A frame carrying only a degraded state, for hosts to show an explicit
    /// "no data" / "awaiting first tick" panel.
    #[must_use]
    pub fn degraded(state: FrameState, viewport_state: ViewportState) -> Self {
        Self {
            state,
            viewport_state,
            window: VisibleWindow { start: 0, end: 0 },
            pane_height: 0.0,
            candles: Vec::new(),
            volume_bars: Vec::new(),
            tick_labels: Vec::new(),
            overlays: Vec::new(),
            markers: Vec::new(),
            risk: Vec::new(),
            last_price: None,
        }
    }

    /// Pretty-printed JSON snapshot of the frame, for host tooling and
    /// regression fixtures.
    pub fn snapshot_json_pretty(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Formats a price for display. Non-finite values degrade to a placeholder.
#[must_use]
pub fn format_price(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_owned();
    }
    format!("{value:.decimals$}")
}

/// Formats a signed delta with an explicit leading sign.
#[must_use]
pub fn format_signed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_owned();
    }
    format!("{value:+.decimals$}")
}

/// Formats a percentage value, `None` or non-finite degrading to a placeholder.
#[must_use]
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => format!("{value:+.2}%"),
        _ => PLACEHOLDER.to_owned(),
    }
}
