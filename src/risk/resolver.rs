use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{Direction, Position};
use crate::risk::trailing::TrailingSnapshot;

/// Keeps an ATR-style target strictly beyond the stop when the desired
/// target would cross it.
const TAKE_PROFIT_EPSILON: f64 = 1e-6;

/// Rule-type dispatch is a tagged variant: the branches are numeric
/// formulas, not shared behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskRuleKind {
    /// Static stop/target, either absolute prices or offsets from entry.
    Fixed {
        #[serde(default)]
        stop_loss_offset: Option<f64>,
        #[serde(default)]
        take_profit_offset: Option<f64>,
        #[serde(default)]
        stop_loss_price: Option<f64>,
        #[serde(default)]
        take_profit_price: Option<f64>,
    },
    /// Stop follows the favorable extreme; no target.
    Trailing {
        #[serde(default)]
        trailing_distance: Option<f64>,
        #[serde(default)]
        trailing_percent: Option<f64>,
    },
    /// Trailing stop mechanics plus a target pinned beyond the stop.
    AtrTrailing {
        #[serde(default)]
        trailing_distance: Option<f64>,
        #[serde(default)]
        trailing_percent: Option<f64>,
        #[serde(default)]
        take_profit_price: Option<f64>,
    },
}

/// Externally computed stop/target pair. When present it wins verbatim over
/// any rule-derived price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskLevelOverride {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

/// Externally owned risk-rule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    pub id: String,
    pub enabled: bool,
    pub kind: RiskRuleKind,
    #[serde(default)]
    pub override_levels: Option<RiskLevelOverride>,
}

/// One resolved price level with its display metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevel {
    pub price: f64,
    /// Signed distance from the position's average price.
    pub delta_from_avg: f64,
    /// Percent distance from average price; `None` when the average is zero
    /// or non-finite.
    pub percent_from_avg: Option<f64>,
    /// P&L realized if the position exits at this level.
    pub expected_pnl: f64,
}

/// Final stop/target prices and expectations for one (rule, position) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRiskLevels {
    pub rule_id: String,
    pub stop_loss: Option<RiskLevel>,
    pub take_profit: Option<RiskLevel>,
    /// `|take-profit expectation / stop-loss expectation|`; `None` when the
    /// stop-loss expectation is zero or either level is missing.
    pub risk_reward: Option<f64>,
}

/// Combines rule configuration, position, latest price, and trailing state
/// into final stop/target levels. Returns `None` for disabled rules.
#[must_use]
pub fn resolve_risk_levels(
    rule: &RiskRule,
    position: &Position,
    latest_price: Option<f64>,
    snapshot: Option<TrailingSnapshot>,
) -> Option<ResolvedRiskLevels> {
    if !rule.enabled {
        return None;
    }

    let (stop_price, target_price) = match rule.override_levels {
        Some(levels) => (
            levels.stop_loss.filter(|price| price.is_finite()),
            levels.take_profit.filter(|price| price.is_finite()),
        ),
        None => derive_rule_prices(rule, position, latest_price, snapshot),
    };

    let stop_loss = stop_price.map(|price| build_level(price, position));
    let take_profit = target_price.map(|price| build_level(price, position));
    let risk_reward = match (&stop_loss, &take_profit) {
        (Some(stop), Some(target)) if stop.expected_pnl != 0.0 => {
            Some((target.expected_pnl / stop.expected_pnl).abs())
        }
        _ => None,
    };

    trace!(
        rule_id = %rule.id,
        stop = ?stop_price,
        target = ?target_price,
        "resolved risk levels"
    );

    Some(ResolvedRiskLevels {
        rule_id: rule.id.clone(),
        stop_loss,
        take_profit,
        risk_reward,
    })
}

fn derive_rule_prices(
    rule: &RiskRule,
    position: &Position,
    latest_price: Option<f64>,
    snapshot: Option<TrailingSnapshot>,
) -> (Option<f64>, Option<f64>) {
    match rule.kind {
        RiskRuleKind::Trailing {
            trailing_distance,
            trailing_percent,
        } => {
            let stop = trailing_stop(
                position,
                latest_price,
                snapshot,
                trailing_distance,
                trailing_percent,
            );
            // Trailing rules manage the exit through the stop alone.
            (stop, None)
        }
        RiskRuleKind::AtrTrailing {
            trailing_distance,
            trailing_percent,
            take_profit_price,
        } => {
            let stop = trailing_stop(
                position,
                latest_price,
                snapshot,
                trailing_distance,
                trailing_percent,
            );
            let desired = take_profit_price
                .filter(|price| price.is_finite())
                .or(latest_price)
                .or_else(|| tracked_extreme(position.direction, snapshot));
            let target = match (stop, desired) {
                (Some(stop), Some(desired)) => Some(match position.direction {
                    Direction::Long => desired.max(stop + TAKE_PROFIT_EPSILON),
                    Direction::Short => desired.min(stop - TAKE_PROFIT_EPSILON),
                }),
                (None, desired) => desired,
                (_, None) => None,
            };
            (stop, target)
        }
        RiskRuleKind::Fixed {
            stop_loss_offset,
            take_profit_offset,
            stop_loss_price,
            take_profit_price,
        } => {
            let sign = position.direction.sign();
            let stop = stop_loss_price
                .filter(|price| price.is_finite())
                .or_else(|| offset_price(position.avg_price, stop_loss_offset, -sign));
            let target = take_profit_price
                .filter(|price| price.is_finite())
                .or_else(|| offset_price(position.avg_price, take_profit_offset, sign));
            (stop, target)
        }
    }
}

/// Stop price that follows the tracked extreme and never reverses.
///
/// Longs: `stop = peak - max(distance, (peak - avg) * percent)` once the
/// peak clears the entry, `peak - distance` before that. Shorts mirror via
/// the trough.
fn trailing_stop(
    position: &Position,
    latest_price: Option<f64>,
    snapshot: Option<TrailingSnapshot>,
    trailing_distance: Option<f64>,
    trailing_percent: Option<f64>,
) -> Option<f64> {
    let distance = trailing_distance
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0);
    let percent = trailing_percent
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0);
    let avg = position.avg_price;

    let extreme = tracked_extreme(position.direction, snapshot)
        .or(latest_price)
        .or_else(|| avg.is_finite().then_some(avg))?;

    match position.direction {
        Direction::Long => {
            let threshold = if avg.is_finite() && extreme > avg {
                distance.max((extreme - avg) * percent)
            } else {
                distance
            };
            Some(extreme - threshold)
        }
        Direction::Short => {
            let threshold = if avg.is_finite() && extreme < avg {
                distance.max((avg - extreme) * percent)
            } else {
                distance
            };
            Some(extreme + threshold)
        }
    }
}

fn tracked_extreme(direction: Direction, snapshot: Option<TrailingSnapshot>) -> Option<f64> {
    let snapshot = snapshot?;
    match direction {
        Direction::Long => snapshot.peak.filter(|value| value.is_finite()),
        Direction::Short => snapshot.trough.filter(|value| value.is_finite()),
    }
}

fn offset_price(avg_price: f64, offset: Option<f64>, sign: f64) -> Option<f64> {
    let offset = offset.filter(|value| value.is_finite())?;
    avg_price
        .is_finite()
        .then_some(avg_price + sign * offset)
}

fn build_level(price: f64, position: &Position) -> RiskLevel {
    let delta_from_avg = price - position.avg_price;
    let percent_from_avg = (position.avg_price.is_finite() && position.avg_price != 0.0)
        .then(|| delta_from_avg / position.avg_price * 100.0);

    let expected_pnl = (price - position.mark_price)
        * position.quantity
        * position.direction.sign()
        * position.effective_multiplier();

    RiskLevel {
        price,
        delta_from_avg,
        percent_from_avg,
        expected_pnl,
    }
}
