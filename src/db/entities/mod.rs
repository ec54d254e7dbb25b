#[allow(unused_imports)]
pub mod prelude {
    pub use super::account::Entity as Account;
    pub use super::confirmation::Entity as Confirmation;
    pub use super::credential::Entity as Credential;
}

pub mod account;
pub mod confirmation;
pub mod credential;
