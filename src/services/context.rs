use std::sync::Arc;

use crate::{
    auth::TokenService,
    clock::Clock,
    config::AuthConfig,
    db::Repositories,
    notify::Notifier,
    services::{ConfirmationService, CredentialService, IdentityService},
    session::SessionLimiter,
};

/// Service handles built once at startup and shared read-only.
#[derive(Clone)]
pub struct ServiceContext {
    identity: IdentityService,
    tokens: TokenService,
}

impl ServiceContext {
    pub fn new(
        repos: Repositories,
        tokens: TokenService,
        sessions: SessionLimiter,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        auth: &AuthConfig,
    ) -> Self {
        let credentials = CredentialService::new(repos.credentials, auth.min_password_len);
        let confirmations =
            ConfirmationService::new(repos.confirmations, clock.clone(), auth.confirmation_ttl());
        let identity = IdentityService::new(
            repos.accounts,
            credentials,
            confirmations,
            tokens.clone(),
            sessions,
            notifier,
            clock,
        );

        Self { identity, tokens }
    }

    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
