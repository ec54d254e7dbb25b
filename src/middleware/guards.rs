use std::{marker::PhantomData, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    auth::{Principal, RequiredRole},
    error::AppError,
    state::AppState,
};

/// Validates the bearer token once per request and caches the principal.
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(principal);
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Missing/invalid Authorization header"))?;

        let principal = state.services.identity().authenticate(token)?;

        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

pub type AuthGuard = Principal;

pub struct AuthRoleGuard<R: RequiredRole> {
    pub principal: Principal,
    _marker: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for AuthRoleGuard<R>
where
    R: RequiredRole,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;

        if !principal.has_role(R::required()) {
            tracing::debug!(account_id = %principal.account_id, "missing required role");
            return Err(AppError::forbidden("Missing required role"));
        }

        Ok(Self {
            principal,
            _marker: PhantomData,
        })
    }
}
