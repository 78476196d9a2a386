use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Token lifetimes and signing material
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Seconds before an access token expires
    pub access_token_lifetime_seconds: u64,
    /// Days before a refresh token expires
    pub refresh_token_lifetime_days: u64,
    /// Symmetric HMAC secret. No default: it must be configured.
    pub signing_secret: String,
    /// Secrets shorter than this are rejected at startup (never below 32 bytes)
    pub minimum_secret_length: usize,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "access_token_lifetime_seconds",
                &self.access_token_lifetime_seconds,
            )
            .field(
                "refresh_token_lifetime_days",
                &self.refresh_token_lifetime_days,
            )
            .field("signing_secret", &"[hidden]")
            .field("minimum_secret_length", &self.minimum_secret_length)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or `postgres`
    pub backend: String,
    /// Falls back to the `DATABASE_URL` environment variable when unset
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connect_timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime_seconds: 3600,
            refresh_token_lifetime_days: 7,
            signing_secret: String::new(),
            minimum_secret_length: 32,
        }
    }
}

impl AuthConfig {
    /// Create an auth configuration with default lifetimes
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            ..Default::default()
        }
    }

    pub fn with_access_token_lifetime_seconds(mut self, seconds: u64) -> Self {
        self.access_token_lifetime_seconds = seconds;
        self
    }

    pub fn with_refresh_token_lifetime_days(mut self, days: u64) -> Self {
        self.refresh_token_lifetime_days = days;
        self
    }

    pub fn with_minimum_secret_length(mut self, length: usize) -> Self {
        self.minimum_secret_length = length;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl StorageConfig {
    /// Resolve the database URL from config or the environment
    pub fn resolve_database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
