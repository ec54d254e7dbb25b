use std::sync::Arc;

use uuid::Uuid;

use super::{ConfirmationService, CredentialService, IdentityError};
use crate::{
    auth::{IssuedToken, Principal, TokenService, roles_for},
    clock::Clock,
    config::AdminSeedConfig,
    db::{AccountRepository, Redemption},
    domain::{
        Account, AccountProfile, ApprovalState, ConfirmationPurpose, NewAccount, normalize_email,
    },
    notify::{Notification, NotificationKind, Notifier},
    session::SessionLimiter,
};

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account_id: Uuid,
    pub token: IssuedToken,
}

/// Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// A new password and its confirmation, both supplied by the caller.
pub struct PasswordChange<'a> {
    pub key: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

#[derive(Clone)]
pub struct IdentityService {
    accounts: Arc<dyn AccountRepository>,
    credentials: CredentialService,
    confirmations: ConfirmationService,
    tokens: TokenService,
    sessions: SessionLimiter,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        credentials: CredentialService,
        confirmations: ConfirmationService,
        tokens: TokenService,
        sessions: SessionLimiter,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            credentials,
            confirmations,
            tokens,
            sessions,
            notifier,
            clock,
        }
    }

    /// Enable and lock checks run before the password is looked at, in that order.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, IdentityError> {
        let email = normalize_email(email).ok_or(IdentityError::InvalidCredentials)?;
        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !account.enabled {
            return Err(IdentityError::AccountDisabled);
        }
        if account.locked {
            return Err(IdentityError::AccountLocked);
        }

        let credential = match self.credentials.get(account.id).await {
            Ok(credential) => credential,
            Err(IdentityError::CredentialNotFound) => return Err(IdentityError::InvalidCredentials),
            Err(err) => return Err(err),
        };
        if !self.credentials.verify(password, &credential).await? {
            tracing::debug!(account_id = %account.id, "password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        if !self.sessions.may_admit(&account.email).await {
            return Err(IdentityError::SessionLimitReached);
        }

        account.login_attempts = account.login_attempts.saturating_add(1);
        account.last_login_at = Some(self.clock.now());
        let account = self.accounts.save(&account).await?;

        let token = self.tokens.issue(&account, roles_for(&account))?;
        self.sessions
            .admit(&account.email, &token.session_id, token.expires_at)
            .await;
        tracing::info!(account_id = %account.id, kind = account.kind().as_str(), "login succeeded");

        Ok(LoginOutcome {
            account_id: account.id,
            token,
        })
    }

    pub async fn logout(&self, principal: &Principal) {
        self.sessions
            .revoke(&principal.email, &principal.session_id)
            .await;
        tracing::info!(account_id = %principal.account_id, "logged out");
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal, IdentityError> {
        self.tokens.validate(token).map(Principal::from)
    }

    pub async fn register_customer(
        &self,
        email: &str,
        full_name: &str,
    ) -> Result<Account, IdentityError> {
        let full_name = required("fullName", full_name)?;
        let account = self
            .register(
                email,
                AccountProfile::Customer {
                    full_name: full_name.to_string(),
                },
            )
            .await?;

        self.send_verification(&account).await?;
        Ok(account)
    }

    /// Restaurants wait for an admin; no key is issued yet.
    pub async fn register_restaurant(
        &self,
        email: &str,
        restaurant_name: &str,
        owner_name: &str,
    ) -> Result<Account, IdentityError> {
        let profile = AccountProfile::Restaurant {
            restaurant_name: required("restaurantName", restaurant_name)?.to_string(),
            owner_name: required("ownerName", owner_name)?.to_string(),
            approval: ApprovalState::Pending,
        };
        self.register(email, profile).await
    }

    pub async fn approve_restaurant(&self, id: Uuid) -> Result<Account, IdentityError> {
        let account = self.set_approval(id, ApprovalState::Approved).await?;
        self.send_verification(&account).await?;
        Ok(account)
    }

    /// Withdraws any outstanding verification key and ends live sessions.
    pub async fn reject_restaurant(&self, id: Uuid) -> Result<Account, IdentityError> {
        let account = self.set_approval(id, ApprovalState::Rejected).await?;
        let withdrawn = self
            .confirmations
            .revoke(account.id, ConfirmationPurpose::Verify)
            .await?;
        if withdrawn > 0 {
            tracing::debug!(account_id = %account.id, withdrawn, "verification key withdrawn");
        }
        self.sessions.revoke_all(&account.email).await;
        self.dispatch(Notification {
            recipient: account.email.clone(),
            kind: NotificationKind::RestaurantRejected {
                restaurant_name: account.display_name().to_string(),
            },
        });
        Ok(account)
    }

    /// Spends a verification key on the first password, enabling the account.
    pub async fn activate(&self, change: PasswordChange<'_>) -> Result<Account, IdentityError> {
        let account_id = self
            .redeem(change, ConfirmationPurpose::Verify, Some(self.clock.now()))
            .await?;
        let account = self.require_account(account_id).await?;
        tracing::info!(account_id = %account.id, "account activated");
        Ok(account)
    }

    /// Unknown or never-activated addresses get the same silent success.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let Some(email) = normalize_email(email) else {
            tracing::debug!("password reset requested for malformed address");
            return Ok(());
        };
        let account = match self.accounts.find_by_email(&email).await? {
            Some(account) if account.verified_at.is_some() => account,
            _ => {
                tracing::debug!("password reset requested for unknown or unverified account");
                return Ok(());
            }
        };

        let confirmation = self
            .confirmations
            .create(account.id, ConfirmationPurpose::Reset)
            .await?;
        self.dispatch(Notification {
            recipient: account.email.clone(),
            kind: NotificationKind::PasswordReset {
                display_name: account.display_name().to_string(),
                key: confirmation.key,
            },
        });
        tracing::info!(account_id = %account.id, "password reset requested");
        Ok(())
    }

    pub async fn reset_password(&self, change: PasswordChange<'_>) -> Result<(), IdentityError> {
        let account_id = self.redeem(change, ConfirmationPurpose::Reset, None).await?;
        let account = self.require_account(account_id).await?;
        self.sessions.revoke_all(&account.email).await;
        tracing::info!(account_id = %account.id, "password reset");
        Ok(())
    }

    /// Always re-read; the caller only supplies who they are.
    pub async fn profile(&self, principal: &Principal) -> Result<Account, IdentityError> {
        self.accounts
            .find_by_email(&principal.email)
            .await?
            .ok_or(IdentityError::AccountNotFound)
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> Result<Account, IdentityError> {
        let mut account = self.profile(principal).await?;
        let previous_email = account.email.clone();

        if let Some(raw) = update.email.as_deref() {
            let email = normalize_email(raw)
                .ok_or_else(|| IdentityError::InvalidInput("Invalid email address".to_string()))?;
            if email != account.email {
                if let Some(other) = self.accounts.find_by_email(&email).await? {
                    if other.id != account.id {
                        return Err(IdentityError::EmailInUse);
                    }
                }
                account.email = email;
            }
        }

        if let Some(name) = update.display_name.as_deref() {
            let name = required("displayName", name)?;
            account.profile.set_display_name(name.to_string());
        }

        let account = match self.accounts.save(&account).await {
            Ok(account) => account,
            Err(err) => {
                return Err(match IdentityError::from(err) {
                    IdentityError::DuplicateKey => IdentityError::EmailInUse,
                    other => other,
                });
            }
        };

        if account.email != previous_email {
            self.sessions.revoke_all(&previous_email).await;
            tracing::info!(account_id = %account.id, "email changed, sessions revoked");
        }
        Ok(account)
    }

    pub async fn lock(&self, id: Uuid) -> Result<Account, IdentityError> {
        let account = self
            .modify(id, |account| {
                account.locked = true;
            })
            .await?;
        self.sessions.revoke_all(&account.email).await;
        tracing::info!(account_id = %id, "account locked");
        Ok(account)
    }

    pub async fn unlock(&self, id: Uuid) -> Result<Account, IdentityError> {
        let account = self
            .modify(id, |account| {
                account.locked = false;
            })
            .await?;
        tracing::info!(account_id = %id, "account unlocked");
        Ok(account)
    }

    pub async fn enable(&self, id: Uuid) -> Result<Account, IdentityError> {
        let account = self
            .modify(id, |account| {
                account.enabled = true;
            })
            .await?;
        tracing::info!(account_id = %id, "account enabled");
        Ok(account)
    }

    pub async fn disable(&self, id: Uuid) -> Result<Account, IdentityError> {
        let account = self
            .modify(id, |account| {
                account.enabled = false;
            })
            .await?;
        self.sessions.revoke_all(&account.email).await;
        tracing::info!(account_id = %id, "account disabled");
        Ok(account)
    }

    /// Credential and confirmations go with the account.
    pub async fn delete(&self, id: Uuid) -> Result<(), IdentityError> {
        let account = self.require_account(id).await?;
        if !self.accounts.delete(id).await? {
            return Err(IdentityError::AccountNotFound);
        }
        self.sessions.revoke_all(&account.email).await;
        tracing::info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Creates the configured admin once; an existing address is left alone.
    pub async fn seed_admin(&self, seed: &AdminSeedConfig) -> Result<Option<Account>, IdentityError> {
        let email = normalize_email(&seed.email).ok_or_else(|| {
            IdentityError::Configuration(format!("invalid admin email `{}`", seed.email))
        })?;
        if let Some(existing) = self.accounts.find_by_email(&email).await? {
            tracing::info!(account_id = %existing.id, "admin account already present");
            return Ok(None);
        }

        let hash = self.credentials.hash(&seed.password).await?;
        let account = self
            .accounts
            .insert(NewAccount {
                email,
                profile: AccountProfile::Admin {
                    full_name: seed.full_name.clone(),
                },
                enabled: true,
                verified_at: Some(self.clock.now()),
            })
            .await?;
        self.credentials.upsert(account.id, &hash).await?;
        tracing::info!(account_id = %account.id, "seeded admin account");
        Ok(Some(account))
    }

    async fn register(&self, email: &str, profile: AccountProfile) -> Result<Account, IdentityError> {
        let email = normalize_email(email)
            .ok_or_else(|| IdentityError::InvalidInput("Invalid email address".to_string()))?;
        if self.accounts.exists_by_email(&email).await? {
            return Err(IdentityError::EmailInUse);
        }

        let account = match self.accounts.insert(NewAccount::pending(email, profile)).await {
            Ok(account) => account,
            Err(err) => {
                return Err(match IdentityError::from(err) {
                    IdentityError::DuplicateKey => IdentityError::EmailInUse,
                    other => other,
                });
            }
        };
        tracing::info!(account_id = %account.id, kind = account.kind().as_str(), "account registered");
        Ok(account)
    }

    async fn set_approval(&self, id: Uuid, state: ApprovalState) -> Result<Account, IdentityError> {
        let mut account = self.require_account(id).await?;
        match &mut account.profile {
            AccountProfile::Restaurant { approval, .. } => *approval = state,
            _ => {
                return Err(IdentityError::InvalidInput(
                    "Account is not a restaurant".to_string(),
                ));
            }
        }
        if state == ApprovalState::Rejected {
            account.enabled = false;
        }
        let account = self.accounts.save(&account).await?;
        tracing::info!(account_id = %id, approval = state.as_str(), "restaurant reviewed");
        Ok(account)
    }

    async fn send_verification(&self, account: &Account) -> Result<(), IdentityError> {
        let confirmation = self
            .confirmations
            .create(account.id, ConfirmationPurpose::Verify)
            .await?;
        self.dispatch(Notification {
            recipient: account.email.clone(),
            kind: NotificationKind::AccountVerification {
                display_name: account.display_name().to_string(),
                key: confirmation.key,
            },
        });
        Ok(())
    }

    /// Shared tail of activation and reset. The confirmation is left intact
    /// when the passwords differ or fail policy.
    async fn redeem(
        &self,
        change: PasswordChange<'_>,
        purpose: ConfirmationPurpose,
        activate_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Uuid, IdentityError> {
        if change.password != change.confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }
        self.credentials.check_policy(change.password)?;

        let confirmation = self.confirmations.resolve(change.key, purpose).await?;
        let account = self.require_account(confirmation.account_id).await?;
        if purpose == ConfirmationPurpose::Verify
            && account
                .profile
                .approval()
                .is_some_and(|approval| approval != ApprovalState::Approved)
        {
            tracing::debug!(account_id = %account.id, "verification key for unapproved restaurant");
            return Err(IdentityError::ConfirmationNotFound);
        }
        let password_hash = self.credentials.hash(change.password).await?;

        self.confirmations
            .redeem(Redemption {
                key: confirmation.key,
                account_id: account.id,
                password_hash,
                activate_at,
            })
            .await?;
        Ok(account.id)
    }

    async fn require_account(&self, id: Uuid) -> Result<Account, IdentityError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::AccountNotFound)
    }

    async fn modify(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Account),
    ) -> Result<Account, IdentityError> {
        let mut account = self.require_account(id).await?;
        apply(&mut account);
        Ok(self.accounts.save(&account).await?)
    }

    /// Delivery is best effort; a failed hand-off never undoes the caller's change.
    fn dispatch(&self, notification: Notification) {
        let kind = notification.kind.name();
        if let Err(err) = self.notifier.notify(notification) {
            tracing::warn!(kind, error = %err, "notification not queued");
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, IdentityError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IdentityError::InvalidInput(format!("{field} is required")));
    }
    Ok(value)
}
