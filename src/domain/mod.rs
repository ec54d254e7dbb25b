mod account;
mod confirmation;

pub use account::{
    Account, AccountKind, AccountProfile, AccountState, ApprovalState, NewAccount, normalize_email,
};
pub use confirmation::{Confirmation, ConfirmationPurpose, Credential, NewConfirmation};
