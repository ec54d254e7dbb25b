use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::dao::{DaoContext, DaoResult};
use crate::domain::{
    Account, Confirmation, ConfirmationPurpose, Credential, NewAccount, NewConfirmation,
};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DaoResult<Option<Account>>;
    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<Account>>;
    async fn exists_by_email(&self, email: &str) -> DaoResult<bool>;
    async fn insert(&self, account: NewAccount) -> DaoResult<Account>;
    async fn save(&self, account: &Account) -> DaoResult<Account>;
    /// Removes the account with its credential and confirmations in one unit.
    async fn delete(&self, id: Uuid) -> DaoResult<bool>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_by_account_id(&self, account_id: Uuid) -> DaoResult<Option<Credential>>;
    /// Inserts or replaces the account's only credential.
    async fn save(&self, account_id: Uuid, password_hash: &str) -> DaoResult<Credential>;
    async fn delete_by_account_id(&self, account_id: Uuid) -> DaoResult<u64>;
}

/// Everything needed to spend a confirmation key on a new password.
pub struct Redemption {
    pub key: String,
    pub account_id: Uuid,
    pub password_hash: String,
    /// Set for activation: the account is enabled and stamped verified.
    pub activate_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ConfirmationRepository: Send + Sync {
    async fn find_by_key(&self, key: &str) -> DaoResult<Option<Confirmation>>;
    async fn save(&self, confirmation: NewConfirmation) -> DaoResult<Confirmation>;
    async fn delete(&self, key: &str) -> DaoResult<bool>;
    async fn delete_for_account(
        &self,
        account_id: Uuid,
        purpose: Option<ConfirmationPurpose>,
    ) -> DaoResult<u64>;
    /// Deletes the key and writes the credential atomically. Returns false,
    /// writing nothing, when the key was already gone.
    async fn redeem(&self, redemption: Redemption) -> DaoResult<bool>;
}

#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub confirmations: Arc<dyn ConfirmationRepository>,
}

impl Repositories {
    pub fn from_db(db: &DatabaseConnection) -> Self {
        let daos = DaoContext::new(db);
        Self {
            accounts: Arc::new(daos.accounts()),
            credentials: Arc::new(daos.credentials()),
            confirmations: Arc::new(daos.confirmations()),
        }
    }
}
