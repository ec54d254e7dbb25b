use std::sync::Arc;

use uuid::Uuid;

use super::IdentityError;
use crate::{auth::password, db::CredentialRepository, domain::Credential};

/// Owns the one hashed secret per account. Hashing runs on the blocking pool.
#[derive(Clone)]
pub struct CredentialService {
    repo: Arc<dyn CredentialRepository>,
    min_password_len: usize,
}

impl CredentialService {
    pub fn new(repo: Arc<dyn CredentialRepository>, min_password_len: usize) -> Self {
        Self {
            repo,
            min_password_len,
        }
    }

    pub async fn get(&self, account_id: Uuid) -> Result<Credential, IdentityError> {
        self.repo
            .find_by_account_id(account_id)
            .await?
            .ok_or(IdentityError::CredentialNotFound)
    }

    pub async fn upsert(
        &self,
        account_id: Uuid,
        password_hash: &str,
    ) -> Result<Credential, IdentityError> {
        Ok(self.repo.save(account_id, password_hash).await?)
    }

    pub async fn delete_for_account(&self, account_id: Uuid) -> Result<u64, IdentityError> {
        Ok(self.repo.delete_by_account_id(account_id).await?)
    }

    pub fn check_policy(&self, password: &str) -> Result<(), IdentityError> {
        password::check_policy(password, self.min_password_len)
    }

    /// Checks the policy, then hashes.
    pub async fn hash(&self, password: &str) -> Result<String, IdentityError> {
        self.check_policy(password)?;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|err| IdentityError::Internal(format!("hashing task failed: {err}")))?
    }

    pub async fn verify(
        &self,
        password: &str,
        credential: &Credential,
    ) -> Result<bool, IdentityError> {
        let password = password.to_string();
        let hash = credential.password_hash.clone();
        tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|err| IdentityError::Internal(format!("verify task failed: {err}")))?
    }
}
