use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::core::Bar;
use crate::error::{ChartError, ChartResult};

/// Tick levels are fixed-size and small; stack allocation avoids per-frame heap churn.
pub type PriceTicks = SmallVec<[f64; 8]>;

/// Tuning controls for price-domain autoscaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScaleTuning {
    /// Headroom above the highest visible price, as a fraction of the raw span.
    pub top_padding_ratio: f64,
    /// Headroom below the lowest visible price, as a fraction of the raw span.
    pub bottom_padding_ratio: f64,
    /// Half-width of the synthetic band used when the raw span collapses.
    pub degenerate_half_band: f64,
    /// Number of evenly spaced tick levels, endpoints included.
    pub tick_count: usize,
}

impl Default for PriceScaleTuning {
    fn default() -> Self {
        Self {
            top_padding_ratio: 0.08,
            bottom_padding_ratio: 0.04,
            degenerate_half_band: 1.0,
            tick_count: 8,
        }
    }
}

impl PriceScaleTuning {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.top_padding_ratio.is_finite()
            || !self.bottom_padding_ratio.is_finite()
            || self.top_padding_ratio < 0.0
            || self.bottom_padding_ratio < 0.0
        {
            return Err(ChartError::InvalidConfig(
                "price scale padding ratios must be finite and >= 0".to_owned(),
            ));
        }

        if !self.degenerate_half_band.is_finite() || self.degenerate_half_band <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "price scale degenerate band must be finite and > 0".to_owned(),
            ));
        }

        if self.tick_count < 2 {
            return Err(ChartError::InvalidConfig(
                "price scale tick count must be >= 2".to_owned(),
            ));
        }

        Ok(self)
    }
}

/// Price axis model mapped to an inverted Y pixel axis.
///
/// Mapping functions are total: degenerate domains and non-finite inputs
/// degrade to the pane center instead of producing NaN/Infinity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScale {
    min: f64,
    max: f64,
    tick_count: usize,
}

impl PriceScale {
    /// Creates a scale from an explicit, already-padded price range.
    pub fn new(price_min: f64, price_max: f64) -> ChartResult<Self> {
        if !price_min.is_finite() || !price_max.is_finite() {
            return Err(ChartError::InvalidData(
                "price scale domain must be finite".to_owned(),
            ));
        }

        Ok(Self {
            min: price_min.min(price_max),
            max: price_min.max(price_max),
            tick_count: PriceScaleTuning::default().tick_count,
        })
    }

    /// Computes a padded price domain from visible bars and extra price levels.
    ///
    /// Extra levels (overlay prices, the live quote) participate in the raw
    /// span so annotations never land outside the pane. A collapsed span is
    /// replaced with a synthetic band around the collapsed value.
    pub fn from_visible_bars(
        bars: &[Bar],
        extra_levels: &[f64],
        tuning: PriceScaleTuning,
    ) -> ChartResult<Self> {
        let tuning = tuning.validate()?;

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for bar in bars {
            min = min.min(bar.low);
            max = max.max(bar.high);
        }
        for level in extra_levels {
            if level.is_finite() {
                min = min.min(*level);
                max = max.max(*level);
            }
        }

        if !min.is_finite() || !max.is_finite() {
            return Err(ChartError::InvalidData(
                "price scale cannot be built from empty data".to_owned(),
            ));
        }

        let raw_span = max - min;
        if raw_span <= 0.0 {
            warn!(value = min, "degenerate price range, synthesizing band");
            return Ok(Self {
                min: min - tuning.degenerate_half_band,
                max: max + tuning.degenerate_half_band,
                tick_count: tuning.tick_count,
            });
        }

        Ok(Self {
            min: min - raw_span * tuning.bottom_padding_ratio,
            max: max + raw_span * tuning.top_padding_ratio,
            tick_count: tuning.tick_count,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Maps a price to a pixel Y inside a pane of the given height.
    ///
    /// A collapsed domain or non-finite price maps to the pane center.
    #[must_use]
    pub fn price_to_pixel(self, price: f64, pane_height: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !price.is_finite() || !pane_height.is_finite() {
            return pane_height / 2.0;
        }
        ((self.max - price) / span) * pane_height
    }

    /// Maps a pane-local pixel Y back to a price. Inverse of `price_to_pixel`;
    /// required for overlay dragging.
    #[must_use]
    pub fn pixel_to_price(self, pixel_y: f64, pane_height: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return (self.min + self.max) / 2.0;
        }
        if !pixel_y.is_finite() || !pane_height.is_finite() || pane_height <= 0.0 {
            return (self.min + self.max) / 2.0;
        }
        self.max - (pixel_y / pane_height) * span
    }

    /// Returns evenly spaced tick levels spanning the domain, endpoints included.
    #[must_use]
    pub fn ticks(self) -> PriceTicks {
        let mut levels = PriceTicks::new();
        let steps = (self.tick_count - 1) as f64;
        let span = self.max - self.min;
        for i in 0..self.tick_count {
            levels.push(self.min + span * (i as f64) / steps);
        }
        levels
    }
}
