use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::enrolment::wizard::{DraftStoreError, WizardError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Json(serde_json::Error),
    Draft(DraftStoreError),
    Wizard(WizardError),
    Input(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Json(err) => write!(f, "json error: {}", err),
            AppError::Draft(err) => write!(f, "draft error: {}", err),
            AppError::Wizard(err) => write!(f, "wizard error: {}", err),
            AppError::Input(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Draft(err) => Some(err),
            AppError::Wizard(err) => Some(err),
            AppError::Input(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<DraftStoreError> for AppError {
    fn from(value: DraftStoreError) -> Self {
        Self::Draft(value)
    }
}

impl From<WizardError> for AppError {
    fn from(value: WizardError) -> Self {
        Self::Wizard(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wraps_component_errors_with_a_prefix() {
        let err = AppError::from(WizardError::StepLocked { step: 3 });
        assert_eq!(
            err.to_string(),
            "wizard error: step 3 cannot be opened before the steps leading to it are completed"
        );
        assert!(err.source().is_some());

        let err = AppError::from(ConfigError::ZeroInterval {
            key: "AUTOSAVE_INTERVAL_SECS",
        });
        assert_eq!(
            err.to_string(),
            "configuration error: AUTOSAVE_INTERVAL_SECS must be greater than zero"
        );
        assert!(AppError::Input("empty form".into()).source().is_none());
    }
}
