use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::application::Language;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_COOKIE: &str = "recruiter_session";
const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub wizard: WizardConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let language_code = var_or("APP_DEFAULT_LANGUAGE", Language::default().code());
        let default_language = Language::from_code(&language_code)
            .ok_or(ConfigError::UnsupportedLanguage { code: language_code })?;

        let max_upload_bytes = match env::var("APP_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidUploadLimit)?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let session_cookie = var_or("APP_SESSION_COOKIE", DEFAULT_SESSION_COOKIE);

        let session_idle = match env::var("APP_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidSessionIdle)?,
            Err(_) => DEFAULT_SESSION_IDLE,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            wizard: WizardConfig {
                default_language,
                max_upload_bytes,
                session_cookie,
                session_idle,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Wizard behaviour: fallback language, upload ceiling, and session handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    pub default_language: Language,
    pub max_upload_bytes: usize,
    pub session_cookie: String,
    /// Sessions untouched for this long are dropped along with their working state.
    pub session_idle: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            default_language: Language::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            session_idle: DEFAULT_SESSION_IDLE,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnsupportedLanguage { code: String },
    InvalidUploadLimit,
    InvalidSessionIdle,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnsupportedLanguage { code } => {
                write!(f, "APP_DEFAULT_LANGUAGE '{code}' is not one of: de, en")
            }
            ConfigError::InvalidUploadLimit => {
                write!(f, "APP_MAX_UPLOAD_BYTES must be a positive byte count")
            }
            ConfigError::InvalidSessionIdle => {
                write!(f, "APP_SESSION_IDLE_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::UnsupportedLanguage { .. }
            | ConfigError::InvalidUploadLimit
            | ConfigError::InvalidSessionIdle => None,
        }
    }
}

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
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_DEFAULT_LANGUAGE",
            "APP_MAX_UPLOAD_BYTES",
            "APP_SESSION_COOKIE",
            "APP_SESSION_IDLE_SECS",
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
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.wizard, WizardConfig::default());
    }

    #[test]
    fn reads_wizard_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_LANGUAGE", "EN");
        env::set_var("APP_MAX_UPLOAD_BYTES", "2048");
        env::set_var("APP_SESSION_COOKIE", "wizard");
        env::set_var("APP_SESSION_IDLE_SECS", "90");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.wizard.default_language, Language::English);
        assert_eq!(config.wizard.max_upload_bytes, 2048);
        assert_eq!(config.wizard.session_cookie, "wizard");
        assert_eq!(config.wizard.session_idle, Duration::from_secs(90));
        reset_env();
    }

    #[test]
    fn rejects_invalid_wizard_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_LANGUAGE", "fr");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::UnsupportedLanguage { .. })
        ));

        reset_env();
        env::set_var("APP_MAX_UPLOAD_BYTES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidUploadLimit)
        ));

        reset_env();
        env::set_var("APP_SESSION_IDLE_SECS", "never");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionIdle)
        ));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }
}
