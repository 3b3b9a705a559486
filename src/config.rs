use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Tuning for the enroll/cancel atomic unit
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    // Attempts per call before giving up with a transient conflict
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    // Postgres `lock_timeout` for the advisory locks, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lock_timeout_ms: default_lock_timeout_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl AdmissionConfig {
    /// Exponential backoff before retry number `attempt` (1-based), capped at one second
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(10);
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(factor).min(1_000))
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_lock_timeout_ms() -> u64 {
    2_000
}

fn default_retry_base_delay_ms() -> u64 {
    25
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("CREDITBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
