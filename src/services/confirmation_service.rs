use std::{sync::Arc, time::Duration};

use rand::{Rng, distributions::Alphanumeric, thread_rng};
use uuid::Uuid;

use super::IdentityError;
use crate::{
    clock::Clock,
    db::{ConfirmationRepository, Redemption, dao::DaoLayerError},
    domain::{Confirmation, ConfirmationPurpose, NewConfirmation},
};

pub const KEY_LEN: usize = 48;
const MAX_CREATE_ATTEMPTS: usize = 3;

type KeySource = Arc<dyn Fn() -> String + Send + Sync>;

/// 48 alphanumeric characters from the thread-local CSPRNG, about 285 bits.
pub fn random_key() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LEN)
        .map(char::from)
        .collect()
}

/// Single-use keys for verification and password reset.
#[derive(Clone)]
pub struct ConfirmationService {
    repo: Arc<dyn ConfirmationRepository>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
    key_source: KeySource,
}

impl ConfirmationService {
    pub fn new(
        repo: Arc<dyn ConfirmationRepository>,
        clock: Arc<dyn Clock>,
        ttl: Option<Duration>,
    ) -> Self {
        Self::with_key_source(repo, clock, ttl, Arc::new(random_key))
    }

    pub fn with_key_source(
        repo: Arc<dyn ConfirmationRepository>,
        clock: Arc<dyn Clock>,
        ttl: Option<Duration>,
        key_source: KeySource,
    ) -> Self {
        Self {
            repo,
            clock,
            ttl,
            key_source,
        }
    }

    /// Supersedes any earlier key for the same purpose.
    pub async fn create(
        &self,
        account_id: Uuid,
        purpose: ConfirmationPurpose,
    ) -> Result<Confirmation, IdentityError> {
        let superseded = self
            .repo
            .delete_for_account(account_id, Some(purpose))
            .await?;
        if superseded > 0 {
            tracing::debug!(%account_id, purpose = purpose.as_str(), superseded, "replaced confirmation");
        }

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let candidate = NewConfirmation {
                account_id,
                key: (self.key_source)(),
                purpose,
                created_at: self.clock.now(),
            };
            match self.repo.save(candidate).await {
                Ok(confirmation) => return Ok(confirmation),
                Err(DaoLayerError::UniqueViolation(_)) => {
                    tracing::warn!(attempt, "confirmation key collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(IdentityError::DuplicateKey)
    }

    /// Deletes every outstanding key of one purpose for the account.
    pub async fn revoke(
        &self,
        account_id: Uuid,
        purpose: ConfirmationPurpose,
    ) -> Result<u64, IdentityError> {
        Ok(self.repo.delete_for_account(account_id, Some(purpose)).await?)
    }

    /// Unknown, wrong-purpose and expired keys are indistinguishable.
    pub async fn resolve(
        &self,
        key: &str,
        purpose: ConfirmationPurpose,
    ) -> Result<Confirmation, IdentityError> {
        let confirmation = self
            .repo
            .find_by_key(key)
            .await?
            .filter(|confirmation| confirmation.purpose == purpose)
            .ok_or(IdentityError::ConfirmationNotFound)?;

        if self.is_expired(&confirmation) {
            tracing::debug!(account_id = %confirmation.account_id, "confirmation expired");
            return Err(IdentityError::ConfirmationNotFound);
        }

        Ok(confirmation)
    }

    pub async fn consume(&self, confirmation: &Confirmation) -> Result<(), IdentityError> {
        if self.repo.delete(&confirmation.key).await? {
            Ok(())
        } else {
            Err(IdentityError::ConfirmationNotFound)
        }
    }

    /// Consumes the key and writes the credential in one unit.
    pub async fn redeem(&self, redemption: Redemption) -> Result<(), IdentityError> {
        if self.repo.redeem(redemption).await? {
            Ok(())
        } else {
            Err(IdentityError::ConfirmationNotFound)
        }
    }

    fn is_expired(&self, confirmation: &Confirmation) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        self.clock.now() >= confirmation.created_at + ttl
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::{
        clock::Clock,
        db::ConfirmationRepository,
        domain::ConfirmationPurpose,
        services::IdentityError,
        test_helpers::{InMemoryStore, ManualClock},
    };

    use super::{ConfirmationService, KEY_LEN, random_key};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .expect("timestamp should be valid"),
        ))
    }

    fn service(repo: Arc<InMemoryStore>, clock: Arc<ManualClock>) -> ConfirmationService {
        ConfirmationService::new(repo, clock, None)
    }

    #[test]
    fn random_keys_are_long_and_alphanumeric() {
        let first = random_key();
        let second = random_key();

        assert_eq!(first.len(), KEY_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn consumed_key_cannot_be_reused() {
        let repo = Arc::new(InMemoryStore::new(clock()));
        let service = service(repo, clock());
        let created = service
            .create(Uuid::new_v4(), ConfirmationPurpose::Reset)
            .await
            .expect("create should succeed");

        let resolved = service
            .resolve(&created.key, ConfirmationPurpose::Reset)
            .await
            .expect("key resolves");
        service.consume(&resolved).await.expect("first use succeeds");

        assert!(matches!(
            service.consume(&resolved).await,
            Err(IdentityError::ConfirmationNotFound)
        ));
        assert!(matches!(
            service.resolve(&created.key, ConfirmationPurpose::Reset).await,
            Err(IdentityError::ConfirmationNotFound)
        ));
    }

    #[tokio::test]
    async fn wrong_purpose_does_not_resolve() {
        let repo = Arc::new(InMemoryStore::new(clock()));
        let service = service(repo, clock());
        let created = service
            .create(Uuid::new_v4(), ConfirmationPurpose::Verify)
            .await
            .expect("create should succeed");

        assert!(matches!(
            service.resolve(&created.key, ConfirmationPurpose::Reset).await,
            Err(IdentityError::ConfirmationNotFound)
        ));
    }

    #[tokio::test]
    async fn new_key_supersedes_older_one_for_same_purpose() {
        let repo = Arc::new(InMemoryStore::new(clock()));
        let service = service(repo.clone(), clock());
        let account_id = Uuid::new_v4();

        let verify = service
            .create(account_id, ConfirmationPurpose::Verify)
            .await
            .expect("create should succeed");
        let first = service
            .create(account_id, ConfirmationPurpose::Reset)
            .await
            .expect("create should succeed");
        let second = service
            .create(account_id, ConfirmationPurpose::Reset)
            .await
            .expect("create should succeed");

        assert!(repo.find_by_key(&first.key).await.expect("lookup").is_none());
        assert!(repo.find_by_key(&second.key).await.expect("lookup").is_some());
        assert!(repo.find_by_key(&verify.key).await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn key_collision_is_retried() {
        let repo = Arc::new(InMemoryStore::new(clock()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let service = ConfirmationService::with_key_source(
            repo,
            clock(),
            None,
            Arc::new(move || {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    "SAMEKEY".to_string()
                } else {
                    "OTHERKEY".to_string()
                }
            }),
        );

        let first = service
            .create(Uuid::new_v4(), ConfirmationPurpose::Reset)
            .await
            .expect("first create succeeds");
        let second = service
            .create(Uuid::new_v4(), ConfirmationPurpose::Reset)
            .await
            .expect("second create retries past the collision");

        assert_eq!(first.key, "SAMEKEY");
        assert_eq!(second.key, "OTHERKEY");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_collisions_surface_duplicate_key() {
        let repo = Arc::new(InMemoryStore::new(clock()));
        let service = ConfirmationService::with_key_source(
            repo,
            clock(),
            None,
            Arc::new(|| "FIXED".to_string()),
        );

        service
            .create(Uuid::new_v4(), ConfirmationPurpose::Reset)
            .await
            .expect("first create succeeds");

        assert!(matches!(
            service.create(Uuid::new_v4(), ConfirmationPurpose::Reset).await,
            Err(IdentityError::DuplicateKey)
        ));
    }

    #[tokio::test]
    async fn creation_time_comes_from_the_service_clock() {
        let store_clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0)
                .single()
                .expect("timestamp should be valid"),
        ));
        let clock = clock();
        let repo = Arc::new(InMemoryStore::new(store_clock));
        let service =
            ConfirmationService::new(repo, clock.clone(), Some(Duration::from_secs(3600)));

        let created = service
            .create(Uuid::new_v4(), ConfirmationPurpose::Verify)
            .await
            .expect("create should succeed");

        assert_eq!(created.created_at, clock.now());
        assert!(
            service
                .resolve(&created.key, ConfirmationPurpose::Verify)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn revoke_removes_only_the_given_purpose() {
        let repo = Arc::new(InMemoryStore::new(clock()));
        let service = service(repo.clone(), clock());
        let account_id = Uuid::new_v4();
        let verify = service
            .create(account_id, ConfirmationPurpose::Verify)
            .await
            .expect("create should succeed");
        let reset = service
            .create(account_id, ConfirmationPurpose::Reset)
            .await
            .expect("create should succeed");

        assert_eq!(
            service
                .revoke(account_id, ConfirmationPurpose::Verify)
                .await
                .expect("revoke runs"),
            1
        );
        assert!(repo.find_by_key(&verify.key).await.expect("lookup").is_none());
        assert!(repo.find_by_key(&reset.key).await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn keys_expire_when_ttl_is_configured() {
        let clock = clock();
        let repo = Arc::new(InMemoryStore::new(clock.clone()));
        let service =
            ConfirmationService::new(repo, clock.clone(), Some(Duration::from_secs(3600)));
        let created = service
            .create(Uuid::new_v4(), ConfirmationPurpose::Verify)
            .await
            .expect("create should succeed");

        clock.advance(chrono::Duration::seconds(3599));
        assert!(
            service
                .resolve(&created.key, ConfirmationPurpose::Verify)
                .await
                .is_ok()
        );

        clock.advance(chrono::Duration::seconds(1));
        assert!(matches!(
            service.resolve(&created.key, ConfirmationPurpose::Verify).await,
            Err(IdentityError::ConfirmationNotFound)
        ));
    }
}
