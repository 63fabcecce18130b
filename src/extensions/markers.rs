use chrono::DateTime;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Raw trade-execution event as delivered by the order feed.
///
/// Timestamps and sides arrive as loosely typed strings; malformed events
/// are dropped during alignment rather than failing the render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExecution {
    #[serde(default)]
    pub id: Option<String>,
    pub time: String,
    pub side: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// An execution resolved onto a visible bar slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedMarker {
    pub id: Option<String>,
    pub bar_index: usize,
    pub price: f64,
    pub side: TradeSide,
}

/// Infers the bar interval as the median of positive consecutive timestamp
/// deltas. The median resists outlier gaps from session breaks.
#[must_use]
pub fn infer_bar_interval(bars: &[Bar]) -> Option<f64> {
    let mut deltas: Vec<f64> = bars
        .windows(2)
        .map(|pair| pair[1].time - pair[0].time)
        .filter(|delta| delta.is_finite() && *delta > 0.0)
        .collect();
    if deltas.is_empty() {
        return None;
    }

    deltas.sort_by_key(|delta| OrderedFloat(*delta));
    let mid = deltas.len() / 2;
    let median = if deltas.len() % 2 == 0 {
        (deltas[mid - 1] + deltas[mid]) / 2.0
    } else {
        deltas[mid]
    };
    Some(median)
}

/// Maps executions onto visible-bar indices.
///
/// Each bar owns the half-open window `[time, time + interval)`, where the
/// interval is the explicit one when known and the inferred median otherwise.
/// An execution outside every window falls back to the bar with the smallest
/// absolute timestamp delta; the fallback distance is unbounded. Executions
/// with unparsable timestamps or unknown sides are dropped. Output is sorted
/// by `bar_index`.
#[must_use]
pub fn align_markers(
    executions: &[TradeExecution],
    visible_bars: &[Bar],
    explicit_interval: Option<f64>,
) -> Vec<AlignedMarker> {
    if visible_bars.is_empty() {
        return Vec::new();
    }

    let interval = explicit_interval
        .filter(|value| value.is_finite() && *value > 0.0)
        .or_else(|| infer_bar_interval(visible_bars));

    let mut aligned = Vec::with_capacity(executions.len());
    for execution in executions {
        let Some(timestamp) = parse_timestamp(&execution.time) else {
            debug!(time = %execution.time, "dropping marker with unparsable timestamp");
            continue;
        };
        let Some(side) = parse_side(&execution.side) else {
            debug!(side = %execution.side, "dropping marker with unknown side");
            continue;
        };

        let bar_index = assign_bar_index(timestamp, visible_bars, interval);
        let bar = visible_bars[bar_index];
        let price = execution
            .price
            .filter(|price| price.is_finite())
            .unwrap_or_else(|| derive_marker_price(bar, side));

        aligned.push(AlignedMarker {
            id: execution.id.clone(),
            bar_index,
            price,
            side,
        });
    }

    aligned.sort_by_key(|marker| marker.bar_index);
    aligned
}

fn assign_bar_index(timestamp: f64, bars: &[Bar], interval: Option<f64>) -> usize {
    if let Some(interval) = interval {
        for (index, bar) in bars.iter().enumerate() {
            if timestamp >= bar.time && timestamp < bar.time + interval {
                return index;
            }
        }
    }

    // No window contains the timestamp (or no interval could be inferred):
    // nearest bar by absolute delta.
    bars.iter()
        .enumerate()
        .min_by_key(|(_, bar)| OrderedFloat((bar.time - timestamp).abs()))
        .map(|(index, bar)| {
            debug!(
                timestamp,
                bar_time = bar.time,
                delta = (bar.time - timestamp).abs(),
                "marker fell outside all bar windows, using nearest bar"
            );
            index
        })
        .unwrap_or(0)
}

/// Derives a display price from the assigned bar when the execution carries
/// none: fills print near the extreme the side trades against.
fn derive_marker_price(bar: Bar, side: TradeSide) -> f64 {
    let preferred = match side {
        TradeSide::Buy => bar.low,
        TradeSide::Sell => bar.high,
    };
    [preferred, bar.open, bar.close]
        .into_iter()
        .find(|price| price.is_finite())
        .unwrap_or(bar.close)
}

/// Accepts unix seconds (integral or fractional) or an RFC 3339 datetime.
fn parse_timestamp(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds.is_finite().then_some(seconds);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|time| time.timestamp_millis() as f64 / 1000.0)
}

fn parse_side(raw: &str) -> Option<TradeSide> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "buy" => Some(TradeSide::Buy),
        "sell" => Some(TradeSide::Sell),
        _ => None,
    }
}
