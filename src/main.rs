use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use food_identity::{
    auth::TokenService,
    clock::{Clock, SystemClock},
    config::AppConfig,
    db::{Repositories, connection},
    logging::init_tracing,
    middleware::{catch_panic_layer, json_error_middleware},
    notify::{MailRenderer, NotificationQueue, transport_from_config},
    routes::router,
    services::ServiceContext,
    session::{MemorySessionStore, RedisSessionStore, SessionLimiter, SessionStore},
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        eprintln!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("failed to load config")?;
    init_tracing(&cfg.logging.rust_log);

    let db = connection::connect(cfg.database.as_ref()).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let tokens = TokenService::new(
        cfg.auth.jwt_secret.as_bytes(),
        cfg.auth.token_ttl(),
        clock.clone(),
    );

    let session_store: Arc<dyn SessionStore> = match cfg.session.redis_url.as_deref() {
        Some(url) => Arc::new(RedisSessionStore::new(url)?),
        None => {
            tracing::warn!("no redis url configured; session cap is tracked per process");
            Arc::new(MemorySessionStore::new())
        }
    };
    let sessions = SessionLimiter::new(
        session_store,
        cfg.session.max_sessions,
        clock.clone(),
        cfg.session.store_timeout(),
    );

    let notifier = NotificationQueue::spawn(
        cfg.notify.queue_size,
        MailRenderer::new(&cfg.notify.public_base_url),
        transport_from_config(&cfg.notify)?,
    );

    let services = ServiceContext::new(
        Repositories::from_db(&db),
        tokens,
        sessions,
        Arc::new(notifier),
        clock,
        &cfg.auth,
    );

    if let Some(seed) = cfg.auth.admin.as_ref() {
        services
            .identity()
            .seed_admin(seed)
            .await
            .context("admin seed failed")?;
    }

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;
    let state = AppState::new(cfg, services);

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
