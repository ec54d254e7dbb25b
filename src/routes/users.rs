use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use super::dto::AccountSummary;
use crate::{
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{PasswordChange, ProfileUpdate},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerRequest {
    pub email_address: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRestaurantRequest {
    pub email_address: String,
    pub restaurant_name: String,
    pub owner_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub key: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email_address: Option<String>,
    pub display_name: Option<String>,
}

impl PasswordChangeRequest {
    fn as_change(&self) -> PasswordChange<'_> {
        PasswordChange {
            key: &self.key,
            password: &self.password,
            confirm_password: &self.confirm_password,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register/customer", post(register_customer))
        .route("/register/restaurant", post(register_restaurant))
        .route("/verify", post(verify))
        .route("/password-reset/request", post(request_reset))
        .route("/password-reset/fulfill", post(fulfill_reset))
        .route("/me", get(me).put(update_me))
        .with_state(state)
}

async fn register_customer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterCustomerRequest>,
) -> ApiResult<AccountSummary> {
    let account = state
        .services
        .identity()
        .register_customer(&body.email_address, &body.full_name)
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", account.into())
}

async fn register_restaurant(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRestaurantRequest>,
) -> ApiResult<AccountSummary> {
    let account = state
        .services
        .identity()
        .register_restaurant(&body.email_address, &body.restaurant_name, &body.owner_name)
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", account.into())
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordChangeRequest>,
) -> ApiResult<serde_json::Value> {
    state.services.identity().activate(body.as_change()).await?;
    JsonApiResponse::ok(json!({ "verified": true }))
}

async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetRequest>,
) -> ApiResult<serde_json::Value> {
    state
        .services
        .identity()
        .request_password_reset(&body.email)
        .await?;
    JsonApiResponse::ok(json!({ "requested": true }))
}

async fn fulfill_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordChangeRequest>,
) -> ApiResult<serde_json::Value> {
    state
        .services
        .identity()
        .reset_password(body.as_change())
        .await?;
    JsonApiResponse::ok(json!({ "reset": true }))
}

async fn me(State(state): State<Arc<AppState>>, principal: AuthGuard) -> ApiResult<AccountSummary> {
    let account = state.services.identity().profile(&principal).await?;
    JsonApiResponse::ok(account.into())
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<AccountSummary> {
    let account = state
        .services
        .identity()
        .update_profile(
            &principal,
            ProfileUpdate {
                email: body.email_address,
                display_name: body.display_name,
            },
        )
        .await?;
    JsonApiResponse::ok(account.into())
}
