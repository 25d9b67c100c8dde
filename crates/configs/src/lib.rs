//! # Settings
//!
//! Layered configuration, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `config/default.toml`
//! 3. `config/{APP_ENV}.toml` (`APP_ENV` defaults to `development`)
//! 4. `APP__SECTION__KEY` environment variables, e.g. `APP__AI__BASE_URL`
//!
//! A `.env` file is read into the process environment first when present.
//!
//! ```toml
//! [ai]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//!
//! [auth]
//! jwt_secret = "..."
//!
//! [log]
//! format = "json"
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// Postgres URL. Without one the in-memory store is used.
    #[serde(default)]
    pub url: Option<SecretString>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_ai_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_ai_base_url() -> String {
    "http://localhost:8000".into()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_ai_connect_timeout_secs() -> u64 {
    5
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
            connect_timeout_secs: default_ai_connect_timeout_secs(),
        }
    }
}

impl AiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "empty_secret")]
    pub jwt_secret: SecretString,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

fn default_issuer() -> String {
    "ai-valley".into()
}

fn default_access_ttl_minutes() -> i64 {
    30
}

fn default_refresh_ttl_days() -> i64 {
    14
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: empty_secret(),
            issuer: default_issuer(),
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_days: default_refresh_ttl_days(),
        }
    }
}

/// Without `smtp_host`, verification codes are only written to the log.
#[derive(Debug, Deserialize)]
pub struct MailSettings {
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default = "default_mail_from")]
    pub from: String,
    #[serde(default = "default_verification_ttl_minutes")]
    pub verification_ttl_minutes: i64,
}

fn default_mail_from() -> String {
    "AI Valley <no-reply@aivalley.local>".into()
}

fn default_verification_ttl_minutes() -> i64 {
    10
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            smtp_host: None,
            username: None,
            password: None,
            from: default_mail_from(),
            verification_ttl_minutes: default_verification_ttl_minutes(),
        }
    }
}

/// Without a URL, revoked tokens are tracked in process memory.
#[derive(Debug, Default, Deserialize)]
pub struct RedisSettings {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Loads `.env`, the TOML files under `./config` and `APP__*` variables,
    /// then validates the result.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &env)
    }

    pub fn load_from(dir: &Path, env: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join(format!("{env}.toml"))).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.access_ttl_minutes <= 0 || self.auth.refresh_ttl_days <= 0 {
            return Err(ConfigError::Invalid("auth token lifetimes must be positive".into()));
        }
        if self.ai.timeout_secs == 0 || self.ai.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("ai timeouts must be greater than zero".into()));
        }
        if !valid_http_url(&self.ai.base_url) {
            return Err(ConfigError::Invalid(format!(
                "ai.base_url '{}' is not an http(s) URL",
                self.ai.base_url
            )));
        }
        if self.mail.verification_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "mail.verification_ttl_minutes must be positive".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn valid_http_url(raw: &str) -> bool {
    let rest = raw
        .strip_prefix("http://")
        .or_else(|| raw.strip_prefix("https://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings> {
        Settings::build(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let settings = from_toml("[auth]\njwt_secret = \"s3cret\"").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.ai.timeout(), Duration::from_secs(30));
        assert_eq!(settings.ai.connect_timeout(), Duration::from_secs(5));
        assert_eq!(settings.auth.access_ttl_minutes, 30);
        assert_eq!(settings.auth.refresh_ttl_days, 14);
        assert_eq!(settings.mail.verification_ttl_minutes, 10);
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn files_override_defaults() {
        let settings = from_toml(
            r#"
            [server]
            port = 9090

            [ai]
            base_url = "https://ai.internal:8443/v1"
            timeout_secs = 10

            [auth]
            jwt_secret = "s3cret"

            [log]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.ai.base_url, "https://ai.internal:8443/v1");
        assert_eq!(settings.ai.timeout_secs, 10);
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn empty_jwt_secret_is_rejected() {
        let err = from_toml("[server]\nport = 8080").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("jwt_secret")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = from_toml("[auth]\njwt_secret = \"x\"\n[ai]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("timeouts")));
    }

    #[test]
    fn malformed_ai_url_is_rejected() {
        for url in ["localhost:8000", "ftp://ai", "http://", "http:// spaced"] {
            let toml = format!("[auth]\njwt_secret = \"x\"\n[ai]\nbase_url = \"{url}\"");
            assert!(from_toml(&toml).is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn secrets_do_not_leak_through_debug() {
        let settings = from_toml("[auth]\njwt_secret = \"hunter2-hunter2\"").unwrap();
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[test]
    fn repository_config_directory_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config");
        let settings = Settings::load_from(&dir, "development").unwrap();
        assert_eq!(settings.auth.issuer, "ai-valley");
        assert!(settings.log.level.starts_with("debug"));
    }
}
