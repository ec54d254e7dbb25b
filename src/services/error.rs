use crate::{db::dao::DaoLayerError, notify::NotifyError};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("Credential not found")]
    CredentialNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is locked")]
    AccountLocked,
    #[error("Account is disabled")]
    AccountDisabled,
    #[error("Invalid or expired token")]
    TokenInvalid,
    #[error("Email address is already in use")]
    EmailInUse,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {min_len} characters")]
    PasswordTooShort { min_len: usize },
    #[error("Confirmation key not found")]
    ConfirmationNotFound,
    #[error("Too many active sessions")]
    SessionLimitReached,
    #[error("{0}")]
    InvalidInput(String),
    #[error("external service failed: {0}")]
    ExternalService(String),
    #[error("duplicate key")]
    DuplicateKey,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DaoLayerError> for IdentityError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::InvalidRow { .. } => Self::Configuration(err.to_string()),
            DaoLayerError::UniqueViolation(_) => Self::DuplicateKey,
            DaoLayerError::Db(_) | DaoLayerError::NotFound { .. } => Self::Storage(err.to_string()),
        }
    }
}

impl From<NotifyError> for IdentityError {
    fn from(err: NotifyError) -> Self {
        Self::ExternalService(err.to_string())
    }
}
