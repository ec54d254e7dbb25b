pub mod confirmation_service;
pub mod context;
pub mod credential_service;
mod error;
pub mod identity_service;

pub use confirmation_service::ConfirmationService;
pub use context::ServiceContext;
pub use credential_service::CredentialService;
pub use error::IdentityError;
pub use identity_service::{IdentityService, LoginOutcome, PasswordChange, ProfileUpdate};
