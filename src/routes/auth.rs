use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::LoginOutcome,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub email_address: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id: Uuid,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let outcome = state
        .services
        .identity()
        .login(&body.email_address, &body.password)
        .await?;
    JsonApiResponse::ok(outcome.into())
}

async fn logout(State(state): State<Arc<AppState>>, principal: AuthGuard) -> ApiResult<LogoutResponse> {
    state.services.identity().logout(&principal).await;
    JsonApiResponse::ok(LogoutResponse { logged_out: true })
}

impl From<LoginOutcome> for TokenResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            id: outcome.account_id,
            token: outcome.token.token,
            token_type: outcome.token.token_type,
            expires_in: outcome.token.expires_in,
        }
    }
}
