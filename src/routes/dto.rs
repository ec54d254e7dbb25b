use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Account, AccountKind, AccountState, ApprovalState};

/// Public view of an account. Never carries credential or key material.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub email_address: String,
    pub kind: AccountKind,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalState>,
    pub state: AccountState,
    pub login_count: i32,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        let owner_name = match &account.profile {
            crate::domain::AccountProfile::Restaurant { owner_name, .. } => {
                Some(owner_name.clone())
            }
            _ => None,
        };

        Self {
            id: account.id,
            email_address: account.email.clone(),
            kind: account.kind(),
            display_name: account.display_name().to_string(),
            owner_name,
            approval: account.profile.approval(),
            state: account.state(),
            login_count: account.login_attempts,
            created_at: account.created_at,
            last_login_at: account.last_login_at,
        }
    }
}
