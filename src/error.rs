use crate::services::IdentityError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Locked(String),
    TooManyRequests(String),
    BadGateway(String),
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn locked(message: impl Into<String>) -> Self {
        Self::Locked(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::TooManyRequests(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::BadGateway(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Locked(message)
            | Self::TooManyRequests(message)
            | Self::BadGateway(message)
            | Self::Internal(message) => message.as_str(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials
            | IdentityError::AccountDisabled
            | IdentityError::TokenInvalid => AppError::unauthorized(err.to_string()),
            IdentityError::AccountLocked => AppError::locked(err.to_string()),
            IdentityError::AccountNotFound
            | IdentityError::CredentialNotFound
            | IdentityError::ConfirmationNotFound => AppError::not_found(err.to_string()),
            IdentityError::EmailInUse => AppError::conflict(err.to_string()),
            IdentityError::PasswordMismatch
            | IdentityError::PasswordTooShort { .. }
            | IdentityError::InvalidInput(_) => AppError::bad_request(err.to_string()),
            IdentityError::SessionLimitReached => AppError::too_many_requests(err.to_string()),
            IdentityError::ExternalService(_) => AppError::bad_gateway(err.to_string()),
            IdentityError::DuplicateKey
            | IdentityError::Configuration(_)
            | IdentityError::Storage(_)
            | IdentityError::Internal(_) => {
                tracing::error!(error = %err, "identity operation failed");
                AppError::internal("internal server error")
            }
        }
    }
}
