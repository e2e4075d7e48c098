//! Opt-in tracing setup for hosts embedding `scatter-grid-rs`.
//!
//! The engine only emits `tracing` events. Hosts either call
//! [`init_default_tracing`] or install their own subscriber.

/// Default env filter when `RUST_LOG` is unset.
pub const DEFAULT_TRACING_FILTER: &str = "scatter_grid=info";

/// Installs a compact fmt subscriber when the `telemetry` feature is enabled.
///
/// Returns `false` when the feature is disabled or a global subscriber is
/// already set.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing_with_filter(DEFAULT_TRACING_FILTER)
}

/// Like [`init_default_tracing`], with an explicit fallback filter
/// (for example `"scatter_grid=trace"` while debugging buffer sync).
#[must_use]
pub fn init_tracing_with_filter(fallback_filter: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_filter)),
            )
            .with_target(false)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_filter;
        false
    }
}
