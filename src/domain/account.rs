use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Admin,
    Restaurant,
    Customer,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Admin => "admin",
            AccountKind::Restaurant => "restaurant",
            AccountKind::Customer => "customer",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(AccountKind::Admin),
            "restaurant" => Ok(AccountKind::Restaurant),
            "customer" => Ok(AccountKind::Customer),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ApprovalState {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(ApprovalState::Pending),
            "approved" => Ok(ApprovalState::Approved),
            "rejected" => Ok(ApprovalState::Rejected),
            _ => Err(()),
        }
    }
}

/// Variant-specific data, resolved once when a row is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountProfile {
    Admin {
        full_name: String,
    },
    Restaurant {
        restaurant_name: String,
        owner_name: String,
        approval: ApprovalState,
    },
    Customer {
        full_name: String,
    },
}

impl AccountProfile {
    pub fn kind(&self) -> AccountKind {
        match self {
            AccountProfile::Admin { .. } => AccountKind::Admin,
            AccountProfile::Restaurant { .. } => AccountKind::Restaurant,
            AccountProfile::Customer { .. } => AccountKind::Customer,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AccountProfile::Admin { full_name } | AccountProfile::Customer { full_name } => {
                full_name
            }
            AccountProfile::Restaurant {
                restaurant_name, ..
            } => restaurant_name,
        }
    }

    pub fn set_display_name(&mut self, name: String) {
        match self {
            AccountProfile::Admin { full_name } | AccountProfile::Customer { full_name } => {
                *full_name = name;
            }
            AccountProfile::Restaurant {
                restaurant_name, ..
            } => *restaurant_name = name,
        }
    }

    pub fn approval(&self) -> Option<ApprovalState> {
        match self {
            AccountProfile::Restaurant { approval, .. } => Some(*approval),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountState {
    PendingApproval,
    Rejected,
    PendingVerification,
    Active,
    Locked,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub profile: AccountProfile,
    pub enabled: bool,
    pub locked: bool,
    pub login_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        self.profile.kind()
    }

    pub fn display_name(&self) -> &str {
        self.profile.display_name()
    }

    pub fn state(&self) -> AccountState {
        match self.profile.approval() {
            Some(ApprovalState::Pending) => return AccountState::PendingApproval,
            Some(ApprovalState::Rejected) => return AccountState::Rejected,
            _ => {}
        }

        if self.locked {
            AccountState::Locked
        } else if self.verified_at.is_none() {
            AccountState::PendingVerification
        } else if !self.enabled {
            AccountState::Disabled
        } else {
            AccountState::Active
        }
    }
}

/// Data for an account that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub profile: AccountProfile,
    pub enabled: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

impl NewAccount {
    pub fn pending(email: String, profile: AccountProfile) -> Self {
        Self {
            email,
            profile,
            enabled: false,
            verified_at: None,
        }
    }
}

/// Trims and lower-cases an address; rejects anything without a local part and domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(email)
}
