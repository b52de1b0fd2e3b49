//! Telemetry helpers for hosts embedding `chart-bridge`.
//!
//! Every lifecycle and renderer failure is reported through `tracing` under
//! the `chart_bridge` target and then suppressed, so a host that wants to see
//! them must install a subscriber. Either call `init_default_tracing` or wire
//! your own subscriber and filters.

/// Target prefix shared by all events emitted from this crate.
pub const LOG_TARGET: &str = "chart_bridge";

/// Initializes a default `tracing` subscriber when the `telemetry` feature is enabled.
///
/// The filter comes from `RUST_LOG` when set, otherwise `chart_bridge=info`.
/// Returns `false` when the feature is disabled or a global subscriber was
/// already installed by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(format!("{LOG_TARGET}=info"))
                }),
            )
            .with_target(true)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
