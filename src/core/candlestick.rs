use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel-projection")]
use rayon::prelude::*;

use crate::core::{Bar, PriceScale, ViewportTuning};
use crate::error::{ChartError, ChartResult};

/// Projected candle geometry in pane-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleGeometry {
    pub center_x: f64,
    pub body_left: f64,
    pub body_right: f64,
    pub body_top: f64,
    pub body_bottom: f64,
    pub wick_top: f64,
    pub wick_bottom: f64,
    pub is_bullish: bool,
}

/// Projected volume histogram bar anchored to the pane bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBarGeometry {
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub height: f64,
    pub is_bullish: bool,
}

/// Fraction of the pane height reserved for the volume histogram.
const VOLUME_PANE_RATIO: f64 = 0.2;

/// Projects visible bars into deterministic candle geometry.
///
/// Bars occupy consecutive slots from the pane's left edge; slot `i` is
/// centered at `(i + 0.5) * bar_step`. The function is pure and side-effect
/// free so it can be used both in rendering and in regression tests.
pub fn project_candles(
    bars: &[Bar],
    price_scale: PriceScale,
    pane_height: f64,
    candle_width_px: f64,
    tuning: ViewportTuning,
) -> ChartResult<Vec<CandleGeometry>> {
    if !candle_width_px.is_finite() || candle_width_px <= 0.0 {
        return Err(ChartError::InvalidData(
            "candle width must be finite and > 0".to_owned(),
        ));
    }

    let step = tuning.bar_step_px(candle_width_px);

    // For large windows, optional parallel projection keeps output identical
    // while reducing wall-clock projection time.
    #[cfg(feature = "parallel-projection")]
    {
        Ok(bars
            .par_iter()
            .enumerate()
            .map(|(slot, bar)| {
                project_single_candle(slot, *bar, price_scale, pane_height, candle_width_px, step)
            })
            .collect())
    }

    #[cfg(not(feature = "parallel-projection"))]
    {
        Ok(bars
            .iter()
            .enumerate()
            .map(|(slot, bar)| {
                project_single_candle(slot, *bar, price_scale, pane_height, candle_width_px, step)
            })
            .collect())
    }
}

fn project_single_candle(
    slot: usize,
    bar: Bar,
    price_scale: PriceScale,
    pane_height: f64,
    candle_width_px: f64,
    step: f64,
) -> CandleGeometry {
    let half = candle_width_px / 2.0;
    let center_x = (slot as f64 + 0.5) * step;
    let open_y = price_scale.price_to_pixel(bar.open, pane_height);
    let close_y = price_scale.price_to_pixel(bar.close, pane_height);

    CandleGeometry {
        center_x,
        body_left: center_x - half,
        body_right: center_x + half,
        body_top: open_y.min(close_y),
        body_bottom: open_y.max(close_y),
        wick_top: price_scale.price_to_pixel(bar.high, pane_height),
        wick_bottom: price_scale.price_to_pixel(bar.low, pane_height),
        is_bullish: bar.is_bullish(),
    }
}

/// Projects visible bar volumes into a bottom-anchored histogram.
///
/// Bars without a finite volume produce no geometry; when no visible bar
/// carries volume the histogram is empty rather than degenerate.
#[must_use]
pub fn project_volume_bars(
    bars: &[Bar],
    pane_height: f64,
    candle_width_px: f64,
    tuning: ViewportTuning,
) -> Vec<VolumeBarGeometry> {
    let max_volume = bars
        .iter()
        .filter_map(|bar| bar.volume)
        .filter(|volume| volume.is_finite() && *volume > 0.0)
        .fold(0.0_f64, f64::max);
    if max_volume <= 0.0 {
        return Vec::new();
    }

    let step = tuning.bar_step_px(candle_width_px);
    let band_height = pane_height * VOLUME_PANE_RATIO;

    bars.iter()
        .enumerate()
        .filter_map(|(slot, bar)| {
            let volume = bar.volume.filter(|volume| volume.is_finite() && *volume >= 0.0)?;
            let height = band_height * (volume / max_volume);
            let center_x = (slot as f64 + 0.5) * step;
            Some(VolumeBarGeometry {
                left: center_x - candle_width_px / 2.0,
                width: candle_width_px,
                top: pane_height - height,
                height,
                is_bullish: bar.is_bullish(),
            })
        })
        .collect()
}
