pub mod resolver;
pub mod trailing;

pub use resolver::{
    ResolvedRiskLevels, RiskLevel, RiskLevelOverride, RiskRule, RiskRuleKind, resolve_risk_levels,
};
pub use trailing::{TrailKey, TrailingBook, TrailingSnapshot};
