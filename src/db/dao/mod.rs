pub mod account_dao;
pub mod base;
pub mod base_traits;
pub mod confirmation_dao;
mod context;
pub mod credential_dao;
pub mod error;

pub use account_dao::AccountDao;
pub use base::DaoBase;
pub use base_traits::{HasIdActiveModel, TimestampedActiveModel};
pub use confirmation_dao::ConfirmationDao;
pub use context::DaoContext;
pub use credential_dao::CredentialDao;
pub use error::{DaoLayerError, DaoResult};
