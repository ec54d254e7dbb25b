use anyhow::{Result, bail};

use super::{AppConfig, configs::DEV_JWT_SECRET};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if cfg.auth.jwt_secret.trim().is_empty() {
        errors.push("auth.jwt_secret must not be empty".to_string());
    } else if !cfg!(debug_assertions) && cfg.auth.jwt_secret == DEV_JWT_SECRET {
        errors.push("auth.jwt_secret must be set in release builds".to_string());
    }

    if cfg.auth.token_ttl_secs == 0 {
        errors.push("auth.token_ttl_secs must be > 0".to_string());
    }

    if cfg.auth.min_password_len == 0 {
        errors.push("auth.min_password_len must be > 0".to_string());
    }

    if cfg.auth.confirmation_ttl_secs == Some(0) {
        errors.push("auth.confirmation_ttl_secs must be > 0 when set".to_string());
    }

    if let Some(admin) = cfg.auth.admin.as_ref() {
        if admin.email.trim().is_empty() {
            errors.push("auth.admin.email must not be empty".to_string());
        }

        if admin.password.len() < cfg.auth.min_password_len {
            errors.push(format!(
                "auth.admin.password must be at least {} characters",
                cfg.auth.min_password_len
            ));
        }
    }

    if cfg.session.max_sessions == 0 {
        errors.push("session.max_sessions must be > 0".to_string());
    }

    if cfg.session.store_timeout_ms == 0 {
        errors.push("session.store_timeout_ms must be > 0".to_string());
    }

    if let Some(url) = cfg.session.redis_url.as_ref() {
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            errors.push("session.redis_url must use redis:// or rediss://".to_string());
        }
    }

    if cfg.notify.queue_size == 0 {
        errors.push("notify.queue_size must be > 0".to_string());
    }

    if cfg.notify.api_url.is_some() && cfg.notify.api_key.is_none() {
        errors.push("notify.api_key is required when notify.api_url is set".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use crate::config::{AdminSeedConfig, AppConfig, DatabaseConfig};

    use super::validate;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "  ".to_string();
        cfg.session.max_sessions = 0;
        cfg.database = Some(DatabaseConfig {
            url: "postgres://localhost/food".to_string(),
            max_connections: 1,
            min_idle: 4,
        });

        let message = validate(&cfg).expect_err("config should be rejected").to_string();

        assert!(message.contains("auth.jwt_secret must not be empty"));
        assert!(message.contains("session.max_sessions must be > 0"));
        assert!(message.contains("database.min_idle (4)"));
    }

    #[test]
    fn rejects_admin_password_below_policy() {
        let mut cfg = AppConfig::default();
        cfg.auth.min_password_len = 8;
        cfg.auth.admin = Some(AdminSeedConfig {
            email: "admin@example.com".to_string(),
            password: "short".to_string(),
            full_name: "Admin".to_string(),
        });

        let message = validate(&cfg).expect_err("config should be rejected").to_string();

        assert!(message.contains("auth.admin.password must be at least 8 characters"));
    }

    #[test]
    fn rejects_non_redis_session_url() {
        let mut cfg = AppConfig::default();
        cfg.session.redis_url = Some("http://cache:6379".to_string());

        assert!(validate(&cfg).is_err());
    }
}
