//! Tracing subscriber bootstrap.

use slotbook_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Installing twice is not an
/// error; the second call keeps the first subscriber and logs a debug line.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(&settings.log_filter)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(
                target: "slotbook-telemetry",
                format = ?settings.log_format,
                "telemetry initialized"
            );
        }
        Err(err) => {
            tracing::debug!(
                target: "slotbook-telemetry",
                error = %err,
                "tracing subscriber already installed"
            );
        }
    }

    Ok(())
}

fn build_filter(fallback: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback)
            .map_err(|err| anyhow::anyhow!("invalid log filter '{fallback}': {err}")),
    }
}
