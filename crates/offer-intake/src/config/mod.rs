use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the intake pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub cache: CacheConfig,
    pub wizard: WizardConfig,
    pub endpoints: EndpointConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let directory_ttl_secs = read_u64("DIRECTORY_CACHE_TTL_SECS", 120)?;
        let draft_expiry_hours = read_u64("DRAFT_EXPIRY_HOURS", 24)?;
        let autosave_interval_secs = read_u64("AUTOSAVE_INTERVAL_SECS", 30)?;
        if autosave_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval {
                key: "AUTOSAVE_INTERVAL_SECS",
            });
        }

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            cache: CacheConfig {
                directory_ttl: Duration::from_secs(directory_ttl_secs),
            },
            wizard: WizardConfig {
                draft_expiry: Duration::from_secs(draft_expiry_hours * 60 * 60),
                autosave_interval: Duration::from_secs(autosave_interval_secs),
            },
            endpoints: EndpointConfig {
                validation_api: read_endpoint("VALIDATION_API_URL"),
                submission_api: read_endpoint("SUBMISSION_API_URL"),
                notification_flow: read_endpoint("NOTIFICATION_FLOW_URL"),
                file_forward: read_endpoint("FILE_FORWARD_URL"),
            },
        })
    }
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn read_endpoint(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Lifetimes of the read-through caches.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub directory_ttl: Duration,
}

/// Draft retention and autosave cadence for the enrolment wizard.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub draft_expiry: Duration,
    pub autosave_interval: Duration,
}

/// Collaborator endpoints. `None` means the collaborator is unconfigured.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    pub validation_api: Option<String>,
    pub submission_api: Option<String>,
    pub notification_flow: Option<String>,
    pub file_forward: Option<String>,
}

impl EndpointConfig {
    pub fn validation_configured(&self) -> bool {
        self.validation_api.is_some()
    }

    pub fn submission_configured(&self) -> bool {
        self.submission_api.is_some()
    }

    pub fn notification_configured(&self) -> bool {
        self.notification_flow.is_some()
    }

    pub fn file_forwarding_configured(&self) -> bool {
        self.file_forward.is_some()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    ZeroInterval { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer (found '{value}')")
            }
            ConfigError::ZeroInterval { key } => write!(f, "{key} must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_LOG_LEVEL",
            "DIRECTORY_CACHE_TTL_SECS",
            "DRAFT_EXPIRY_HOURS",
            "AUTOSAVE_INTERVAL_SECS",
            "VALIDATION_API_URL",
            "SUBMISSION_API_URL",
            "NOTIFICATION_FLOW_URL",
            "FILE_FORWARD_URL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.cache.directory_ttl, Duration::from_secs(120));
        assert_eq!(config.wizard.draft_expiry, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.wizard.autosave_interval, Duration::from_secs(30));
        assert!(!config.endpoints.file_forwarding_configured());
    }

    #[test]
    fn blank_endpoints_count_as_unconfigured() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FILE_FORWARD_URL", "   ");
        env::set_var("VALIDATION_API_URL", "https://cricos.example/api");
        let config = AppConfig::load().expect("config loads");
        assert!(!config.endpoints.file_forwarding_configured());
        assert!(config.endpoints.validation_configured());
        assert!(!config.endpoints.submission_configured());
        assert!(!config.endpoints.notification_configured());
        assert_eq!(
            config.endpoints.validation_api.as_deref(),
            Some("https://cricos.example/api")
        );
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DIRECTORY_CACHE_TTL_SECS", "two minutes");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key, .. }) => {
                assert_eq!(key, "DIRECTORY_CACHE_TTL_SECS")
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }
}
