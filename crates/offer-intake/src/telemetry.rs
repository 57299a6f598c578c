use crate::config::TelemetryConfig;
use std::env;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter { value, .. } => {
                write!(f, "APP_LOG_LEVEL '{}' is not a valid tracing filter", value)
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "could not install the log subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Where the active filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    RustLog,
    Configured,
}

/// Pick the log filter. A parsable `RUST_LOG` wins; otherwise the configured
/// level is used and must parse.
pub fn select_filter(
    rust_log: Option<&str>,
    config: &TelemetryConfig,
) -> Result<(EnvFilter, FilterSource), TelemetryError> {
    if let Some(filter) = rust_log
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
    {
        return Ok((filter, FilterSource::RustLog));
    }

    EnvFilter::try_new(&config.log_level)
        .map(|filter| (filter, FilterSource::Configured))
        .map_err(|source| TelemetryError::InvalidFilter {
            value: config.log_level.clone(),
            source,
        })
}

/// Install the global subscriber on stderr so stdout stays clean for the
/// CLI's JSON output.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = env::var("RUST_LOG").ok();
    let (filter, source) = select_filter(rust_log.as_deref(), config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)?;

    tracing::debug!(?source, "log subscriber installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn rust_log_takes_precedence_when_it_parses() {
        let (_, source) =
            select_filter(Some("offer_intake=debug"), &configured("info")).expect("filter");
        assert_eq!(source, FilterSource::RustLog);
    }

    #[test]
    fn blank_or_broken_rust_log_falls_back_to_the_configured_level() {
        for rust_log in [None, Some("   "), Some("offer_intake=loud")] {
            let (_, source) = select_filter(rust_log, &configured("warn")).expect("filter");
            assert_eq!(source, FilterSource::Configured);
        }
    }

    #[test]
    fn unparsable_configured_level_is_reported() {
        let err = select_filter(None, &configured("offer_intake=loud")).expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "APP_LOG_LEVEL 'offer_intake=loud' is not a valid tracing filter"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
