use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{admin, auth, users};

pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router(state.clone()))
        .nest("/users", users::router(state.clone()))
        .nest("/admin", admin::router(state));

    Router::new().nest(API_PREFIX, api)
}
