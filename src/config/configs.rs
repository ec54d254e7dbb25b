use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

pub const DEV_JWT_SECRET: &str = "super-secret-change-me";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub min_password_len: usize,
    /// Unset means confirmation keys stay valid until consumed.
    pub confirmation_ttl_secs: Option<u64>,
    pub admin: Option<AdminSeedConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: defaults::DEFAULT_TOKEN_TTL_SECS as u64,
            min_password_len: defaults::DEFAULT_MIN_PASSWORD_LEN as usize,
            confirmation_ttl_secs: None,
            admin: None,
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn confirmation_ttl(&self) -> Option<Duration> {
        self.confirmation_ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Without a Redis URL sessions are tracked in-process.
    pub redis_url: Option<String>,
    pub max_sessions: usize,
    pub store_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_sessions: defaults::DEFAULT_MAX_SESSIONS as usize,
            store_timeout_ms: defaults::DEFAULT_SESSION_STORE_TIMEOUT_MS as u64,
        }
    }
}

impl SessionConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// HTTP mail API endpoint; mail is only logged when unset.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub public_base_url: String,
    pub queue_size: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            sender_email: defaults::DEFAULT_SENDER_EMAIL.to_string(),
            sender_name: None,
            public_base_url: defaults::DEFAULT_PUBLIC_BASE_URL.to_string(),
            queue_size: defaults::DEFAULT_NOTIFY_QUEUE_SIZE as usize,
        }
    }
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}
