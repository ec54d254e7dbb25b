pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AdminSeedConfig, AppConfig, AuthConfig, DatabaseConfig, GeneralConfig, LoggingConfig,
    NotifyConfig, SessionConfig,
};
pub use envconfig::EnvConfig;
