//! Log output for the batch run. Structured events go to stderr so the
//! console report on stdout stays readable.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("APP_LOG_LEVEL '{value}' is not a valid log filter")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("a log subscriber is already installed: {0}")]
    AlreadyInstalled(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = run_filter(std::env::var("RUST_LOG").ok(), &config.log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

/// A usable `RUST_LOG` overrides the configured level; a broken one is ignored.
fn run_filter(rust_log: Option<String>, log_level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = rust_log.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(log_level).map_err(|source| TelemetryError::Filter {
        value: log_level.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used_without_rust_log() {
        let filter = run_filter(None, "debug").expect("level parses");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn rust_log_takes_precedence() {
        let filter = run_filter(Some("property_alerts=trace".to_string()), "info")
            .expect("filter parses");
        assert_eq!(filter.to_string(), "property_alerts=trace");
    }

    #[test]
    fn unparseable_level_names_the_setting() {
        let err = run_filter(None, "property_alerts=loud").expect_err("bad level");
        assert!(err.to_string().contains("APP_LOG_LEVEL 'property_alerts=loud'"));
    }
}
