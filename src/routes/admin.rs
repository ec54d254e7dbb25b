use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    routing::{delete, post},
};
use serde::Serialize;
use uuid::Uuid;

use super::dto::AccountSummary;
use crate::{
    auth::AdminRole,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    state::AppState,
};

type AdminGuard = AuthRoleGuard<AdminRole>;

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: Uuid,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/accounts/{id}", delete(delete_account))
        .route("/accounts/{id}/lock", post(lock))
        .route("/accounts/{id}/unlock", post(unlock))
        .route("/accounts/{id}/enable", post(enable))
        .route("/accounts/{id}/disable", post(disable))
        .route("/accounts/{id}/approve", post(approve))
        .route("/accounts/{id}/reject", post(reject))
        .with_state(state)
}

async fn lock(
    State(state): State<Arc<AppState>>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountSummary> {
    let account = state.services.identity().lock(id).await?;
    JsonApiResponse::ok(account.into())
}

async fn unlock(
    State(state): State<Arc<AppState>>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountSummary> {
    let account = state.services.identity().unlock(id).await?;
    JsonApiResponse::ok(account.into())
}

async fn enable(
    State(state): State<Arc<AppState>>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountSummary> {
    let account = state.services.identity().enable(id).await?;
    JsonApiResponse::ok(account.into())
}

async fn disable(
    State(state): State<Arc<AppState>>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountSummary> {
    let account = state.services.identity().disable(id).await?;
    JsonApiResponse::ok(account.into())
}

async fn approve(
    State(state): State<Arc<AppState>>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountSummary> {
    let account = state.services.identity().approve_restaurant(id).await?;
    JsonApiResponse::ok(account.into())
}

async fn reject(
    State(state): State<Arc<AppState>>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountSummary> {
    let account = state.services.identity().reject_restaurant(id).await?;
    JsonApiResponse::ok(account.into())
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    AuthRoleGuard { principal, .. }: AdminGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedResponse> {
    state.services.identity().delete(id).await?;
    tracing::info!(admin = %principal.account_id, deleted = %id, "admin deleted account");
    JsonApiResponse::ok(DeletedResponse { deleted: id })
}
