//! Opt-in tracing setup for hosts embedding the chart engine.
//!
//! The library itself only emits `tracing` events; hosts that already run a
//! subscriber need nothing from here.

/// Installs a compact `tracing` subscriber honoring `RUST_LOG`, defaulting to
/// `riskchart=info` so only this crate's events surface out of the box.
///
/// Returns `false` when the `telemetry` feature is off or a global subscriber
/// is already installed.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("riskchart=info"));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
