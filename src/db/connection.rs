use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::DatabaseConfig;

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Connects and syncs the schema. Without a database section the service runs
/// on a single-connection in-memory SQLite database.
pub async fn connect(cfg: Option<&DatabaseConfig>) -> anyhow::Result<DatabaseConnection> {
    let mut options = match cfg {
        Some(cfg) => {
            let mut options = ConnectOptions::new(cfg.url.clone());
            options
                .max_connections(cfg.max_connections)
                .min_connections(cfg.min_idle);
            options
        }
        None => {
            warn!("no database configured; accounts live in memory and vanish on restart");
            let mut options = ConnectOptions::new(IN_MEMORY_URL.to_string());
            options.max_connections(1).min_connections(1);
            options
        }
    };
    options
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    if db.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
    }

    info!("syncing database schema from entities");
    db.get_schema_registry("food_identity::db::entities::*")
        .sync(&db)
        .await?;
    Ok(db)
}
