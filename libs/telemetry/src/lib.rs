//! Tracing and metrics helpers shared by the relay crates.
//! Installs the `tracing` subscriber and records per-direction relay counters.

use anyhow::Result;

mod config;
mod context;
mod metrics;
mod tracing_init;

pub use config::TelemetryConfig;
pub use context::{Direction, RelayLabels};
pub use metrics::{
    FAILED_COUNTER, FORWARDED_COUNTER, IGNORED_COUNTER, record_counter, record_failed,
    record_forwarded, record_ignored, start_relay_span, with_common_fields,
};
pub use tracing_init::init_telemetry;

/// Installs the tracing subscriber configured from `RUST_LOG` and `LOG_FORMAT`.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}
