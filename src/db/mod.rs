pub mod connection;
pub mod dao;
pub mod entities;
pub mod repository;

pub use repository::{
    AccountRepository, ConfirmationRepository, CredentialRepository, Redemption, Repositories,
};
