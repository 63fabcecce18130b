//! riskchart: real-time candlestick charting and risk-overlay engine.
//!
//! This crate implements the chart-math core of a trading dashboard:
//! viewport windowing, price/pixel coordinate mapping, trade-marker
//! alignment, overlay label layout, and trailing stop/target resolution.
//! Rendering backends and panel composition are left to host applications.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod risk;
pub mod telemetry;

pub use api::{ChartEngine, ChartEngineConfig};
pub use error::{ChartError, ChartResult};
