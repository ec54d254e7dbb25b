use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    auth::{TokenService, password},
    clock::{Clock, SystemClock},
    config::AppConfig,
    db::{
        AccountRepository, ConfirmationRepository, CredentialRepository, Redemption,
        Repositories,
        dao::{DaoLayerError, DaoResult},
    },
    domain::{
        Account, AccountProfile, Confirmation, ConfirmationPurpose, Credential, NewAccount,
        NewConfirmation,
    },
    notify::{Notification, NotificationKind, Notifier, NotifyError},
    routes::router,
    services::ServiceContext,
    session::{MemorySessionStore, SessionLimiter, SessionStore, SessionStoreError},
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Fails every call, like a Redis that cannot be reached.
pub struct UnreachableSessionStore;

#[async_trait]
impl SessionStore for UnreachableSessionStore {
    async fn count(&self, _key: &str, _now: i64) -> Result<usize, SessionStoreError> {
        Err(SessionStoreError::Backend("connection refused".to_string()))
    }

    async fn add(
        &self,
        _key: &str,
        _session_id: &str,
        _expires_at: i64,
    ) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Backend("connection refused".to_string()))
    }

    async fn remove(&self, _key: &str, _session_id: &str) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Backend("connection refused".to_string()))
    }

    async fn clear(&self, _key: &str) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Backend("connection refused".to_string()))
    }
}

#[derive(Default)]
struct StoreState {
    accounts: HashMap<Uuid, Account>,
    credentials: HashMap<Uuid, Credential>,
    confirmations: HashMap<String, Confirmation>,
}

/// All three repositories over one lock, so deletes cascade and redemption is
/// atomic the way the database transaction is.
pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            accounts: self.clone(),
            credentials: self.clone(),
            confirmations: self.clone(),
        }
    }

    /// Inserts an active, verified account with an optional password.
    pub fn seed_account(
        &self,
        email: &str,
        profile: AccountProfile,
        password: Option<&str>,
    ) -> Account {
        let now = self.clock.now();
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            profile,
            enabled: true,
            locked: false,
            login_attempts: 0,
            created_at: now,
            last_login_at: None,
            verified_at: Some(now),
        };

        let mut state = self.lock();
        state.accounts.insert(account.id, account.clone());
        if let Some(password) = password {
            let hash = password::hash_password(password).expect("test hash should succeed");
            state.credentials.insert(
                account.id,
                Credential {
                    account_id: account.id,
                    password_hash: hash,
                    updated_at: now,
                },
            );
        }
        account
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.lock().accounts.get(&id).cloned()
    }

    /// Overwrites a stored account without going through a service.
    pub fn put_account(&self, account: Account) {
        self.lock().accounts.insert(account.id, account);
    }

    pub fn credential(&self, account_id: Uuid) -> Option<Credential> {
        self.lock().credentials.get(&account_id).cloned()
    }

    pub fn confirmation_count(&self, account_id: Uuid) -> usize {
        self.lock()
            .confirmations
            .values()
            .filter(|confirmation| confirmation.account_id == account_id)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store lock poisoned")
    }
}

fn email_taken(state: &StoreState, email: &str, except: Option<Uuid>) -> bool {
    state
        .accounts
        .values()
        .any(|account| account.email == email && Some(account.id) != except)
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> DaoResult<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<Account>> {
        Ok(self.lock().accounts.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        Ok(email_taken(&self.lock(), email, None))
    }

    async fn insert(&self, account: NewAccount) -> DaoResult<Account> {
        let mut state = self.lock();
        if email_taken(&state, &account.email, None) {
            return Err(DaoLayerError::UniqueViolation("accounts.email".to_string()));
        }
        let created = Account {
            id: Uuid::new_v4(),
            email: account.email,
            profile: account.profile,
            enabled: account.enabled,
            locked: false,
            login_attempts: 0,
            created_at: self.clock.now(),
            last_login_at: None,
            verified_at: account.verified_at,
        };
        state.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save(&self, account: &Account) -> DaoResult<Account> {
        let mut state = self.lock();
        if !state.accounts.contains_key(&account.id) {
            return Err(DaoLayerError::NotFound {
                entity: "account",
                id: account.id,
            });
        }
        if email_taken(&state, &account.email, Some(account.id)) {
            return Err(DaoLayerError::UniqueViolation("accounts.email".to_string()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> DaoResult<bool> {
        let mut state = self.lock();
        state
            .confirmations
            .retain(|_, confirmation| confirmation.account_id != id);
        state.credentials.remove(&id);
        Ok(state.accounts.remove(&id).is_some())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryStore {
    async fn find_by_account_id(&self, account_id: Uuid) -> DaoResult<Option<Credential>> {
        Ok(self.lock().credentials.get(&account_id).cloned())
    }

    async fn save(&self, account_id: Uuid, password_hash: &str) -> DaoResult<Credential> {
        let credential = Credential {
            account_id,
            password_hash: password_hash.to_string(),
            updated_at: self.clock.now(),
        };
        self.lock().credentials.insert(account_id, credential.clone());
        Ok(credential)
    }

    async fn delete_by_account_id(&self, account_id: Uuid) -> DaoResult<u64> {
        Ok(self.lock().credentials.remove(&account_id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl ConfirmationRepository for InMemoryStore {
    async fn find_by_key(&self, key: &str) -> DaoResult<Option<Confirmation>> {
        Ok(self.lock().confirmations.get(key).cloned())
    }

    async fn save(&self, confirmation: NewConfirmation) -> DaoResult<Confirmation> {
        let mut state = self.lock();
        if state.confirmations.contains_key(&confirmation.key) {
            return Err(DaoLayerError::UniqueViolation("confirmations.key".to_string()));
        }
        let created = Confirmation {
            id: Uuid::new_v4(),
            account_id: confirmation.account_id,
            key: confirmation.key,
            purpose: confirmation.purpose,
            created_at: confirmation.created_at,
        };
        state
            .confirmations
            .insert(created.key.clone(), created.clone());
        Ok(created)
    }

    async fn delete(&self, key: &str) -> DaoResult<bool> {
        Ok(self.lock().confirmations.remove(key).is_some())
    }

    async fn delete_for_account(
        &self,
        account_id: Uuid,
        purpose: Option<ConfirmationPurpose>,
    ) -> DaoResult<u64> {
        let mut state = self.lock();
        let before = state.confirmations.len();
        state.confirmations.retain(|_, confirmation| {
            confirmation.account_id != account_id
                || purpose.is_some_and(|purpose| purpose != confirmation.purpose)
        });
        Ok((before - state.confirmations.len()) as u64)
    }

    async fn redeem(&self, redemption: Redemption) -> DaoResult<bool> {
        let mut state = self.lock();
        let owned_by_account = state
            .confirmations
            .get(&redemption.key)
            .is_some_and(|confirmation| confirmation.account_id == redemption.account_id);
        if !owned_by_account {
            return Ok(false);
        }

        state.confirmations.remove(&redemption.key);
        state.credentials.insert(
            redemption.account_id,
            Credential {
                account_id: redemption.account_id,
                password_hash: redemption.password_hash,
                updated_at: self.clock.now(),
            },
        );
        if let Some(at) = redemption.activate_at {
            if let Some(account) = state.accounts.get_mut(&redemption.account_id) {
                account.enabled = true;
                account.verified_at = Some(at);
            }
        }
        Ok(true)
    }
}

/// Captures notifications instead of queueing them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Rejects every hand-off, like a full queue.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }

    /// Key carried by the most recent verification or reset mail to `recipient`.
    pub fn last_key_for(&self, recipient: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .filter(|notification| notification.recipient == recipient)
            .find_map(|notification| match notification.kind {
                NotificationKind::AccountVerification { key, .. }
                | NotificationKind::PasswordReset { key, .. } => Some(key),
                NotificationKind::RestaurantRejected { .. } => None,
            })
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::QueueFull);
        }
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
        Ok(())
    }
}

pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("timestamp should be valid")
}

/// Services wired to in-memory collaborators, with handles for assertions.
pub struct TestServices {
    pub config: AppConfig,
    pub services: ServiceContext,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(MemorySessionStore::new()), RecordingNotifier::default())
    }

    pub fn with_parts(sessions: Arc<dyn SessionStore>, notifier: RecordingNotifier) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = TEST_JWT_SECRET.to_string();

        let clock = Arc::new(ManualClock::new(test_start()));
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        let notifier = Arc::new(notifier);
        let tokens = TokenService::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.token_ttl(),
            clock.clone(),
        );
        let limiter = SessionLimiter::new(
            sessions,
            config.session.max_sessions,
            clock.clone(),
            config.session.store_timeout(),
        );
        let services = ServiceContext::new(
            store.repositories(),
            tokens,
            limiter,
            notifier.clone(),
            clock.clone(),
            &config.auth,
        );

        Self {
            config,
            services,
            store,
            notifier,
            clock,
        }
    }

    pub fn router(&self) -> Router {
        router(AppState::new(self.config.clone(), self.services.clone()))
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}

pub fn test_router() -> Router {
    TestServices::new().router()
}
