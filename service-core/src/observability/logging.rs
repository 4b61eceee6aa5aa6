use crate::config::LogFormat;
use crate::error::AppError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `log_level` when set.
///
/// Calling this twice is not an error; the second call keeps the first subscriber.
pub fn init_tracing(service_name: &str, log_level: &str, format: LogFormat) -> Result<(), AppError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid log level '{}': {}", log_level, e)))?;

    let json_layer = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .json()
            .flatten_event(true)
    });
    let pretty_layer = (format == LogFormat::Pretty)
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!(service = %service_name, "Tracing already initialised");
        return Ok(());
    }

    tracing::info!(service = %service_name, level = %log_level, format = ?format, "Tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        assert!(init_tracing("test", "debug", LogFormat::Pretty).is_ok());
        assert!(init_tracing("test", "debug", LogFormat::Json).is_ok());
    }
}
