use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationPurpose {
    Verify,
    Reset,
}

impl ConfirmationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationPurpose::Verify => "verify",
            ConfirmationPurpose::Reset => "reset",
        }
    }
}

impl TryFrom<&str> for ConfirmationPurpose {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "verify" => Ok(ConfirmationPurpose::Verify),
            "reset" => Ok(ConfirmationPurpose::Reset),
            _ => Err(()),
        }
    }
}

/// Single-use key tying an account to a pending verification or reset.
#[derive(Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub key: String,
    pub purpose: ConfirmationPurpose,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Confirmation")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("key", &"<redacted>")
            .field("purpose", &self.purpose)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Clone)]
pub struct NewConfirmation {
    pub account_id: Uuid,
    pub key: String,
    pub purpose: ConfirmationPurpose,
    /// Stamped by the issuing service so expiry is judged on one clock.
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for NewConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewConfirmation")
            .field("account_id", &self.account_id)
            .field("key", &"<redacted>")
            .field("purpose", &self.purpose)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The hashed secret for one account. The hash is a PHC string.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account_id: Uuid,
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("password_hash", &"<redacted>")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{Confirmation, ConfirmationPurpose, Credential};

    #[test]
    fn debug_output_redacts_secrets() {
        let credential = Credential {
            account_id: Uuid::new_v4(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            updated_at: Utc::now(),
        };
        let confirmation = Confirmation {
            id: Uuid::new_v4(),
            account_id: credential.account_id,
            key: "supersecretkey".to_string(),
            purpose: ConfirmationPurpose::Reset,
            created_at: Utc::now(),
        };

        assert!(!format!("{credential:?}").contains("argon2id"));
        assert!(!format!("{confirmation:?}").contains("supersecretkey"));
    }

    #[test]
    fn purpose_string_roundtrip() {
        assert_eq!(ConfirmationPurpose::try_from("verify"), Ok(ConfirmationPurpose::Verify));
        assert_eq!(ConfirmationPurpose::try_from("reset"), Ok(ConfirmationPurpose::Reset));
        assert!(ConfirmationPurpose::try_from("invite").is_err());
    }
}
