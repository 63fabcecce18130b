use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::error::{ChartError, ChartResult};

/// Host container size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Canonical OHLCV candle. Time is unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Bar {
    /// Builds a validated bar from raw floating values.
    ///
    /// Invariants:
    /// - all values are finite
    /// - `low <= high`
    /// - `open` and `close` are within `[low, high]`
    /// - `volume`, when present, is finite and >= 0
    pub fn new(
        time: f64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> ChartResult<Self> {
        if !time.is_finite()
            || !open.is_finite()
            || !high.is_finite()
            || !low.is_finite()
            || !close.is_finite()
        {
            return Err(ChartError::InvalidData(
                "ohlc values must be finite".to_owned(),
            ));
        }

        if low > high {
            return Err(ChartError::InvalidData(
                "ohlc low must be <= high".to_owned(),
            ));
        }

        if open < low || open > high || close < low || close > high {
            return Err(ChartError::InvalidData(
                "ohlc open/close must be within low/high range".to_owned(),
            ));
        }

        if let Some(volume) = volume {
            if !volume.is_finite() || volume < 0.0 {
                return Err(ChartError::InvalidData(
                    "volume must be finite and >= 0".to_owned(),
                ));
            }
        }

        Ok(Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Converts strongly-typed temporal/decimal input into a validated bar.
    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Option<Decimal>,
    ) -> ChartResult<Self> {
        let volume = volume.map(|v| decimal_to_f64(v, "volume")).transpose()?;
        Self::new(
            datetime_to_unix_seconds(time),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
            volume,
        )
    }

    /// Returns `true` when close price is greater than or equal to open price.
    #[must_use]
    pub fn is_bullish(self) -> bool {
        self.close >= self.open
    }
}

/// Live quote snapshot from the market-data feed.
///
/// Fields are independent best-effort observations; the effective price is
/// resolved with a fixed precedence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    pub mid: Option<f64>,
    pub last: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub close: Option<f64>,
}

impl PriceQuote {
    #[must_use]
    pub fn from_last(last: f64) -> Self {
        Self {
            last: Some(last),
            ..Self::default()
        }
    }

    /// Resolves the display/trailing price: mid, last, bid, ask, close.
    /// First finite value wins.
    #[must_use]
    pub fn effective_price(self) -> Option<f64> {
        [self.mid, self.last, self.bid, self.ask, self.close]
            .into_iter()
            .flatten()
            .find(|price| price.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for longs, -1.0 for shorts.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Read-only position snapshot supplied by portfolio state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub id: Option<String>,
    pub symbol: String,
    pub direction: Direction,
    pub quantity: f64,
    pub avg_price: f64,
    pub mark_price: f64,
    #[serde(default)]
    pub multiplier: Option<f64>,
}

impl Position {
    /// Stable identity used to key per-position trailing state.
    /// Falls back to the symbol when no explicit id is present.
    #[must_use]
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.symbol)
    }

    /// Contract multiplier, defaulting to 1 when absent or non-finite.
    #[must_use]
    pub fn effective_multiplier(&self) -> f64 {
        match self.multiplier {
            Some(multiplier) if multiplier.is_finite() && multiplier > 0.0 => multiplier,
            _ => 1.0,
        }
    }
}
