use crate::domain::{Account, AccountProfile};

use super::Role;

/// Roles granted to an account. One per variant today; callers treat it as a set.
pub fn roles_for(account: &Account) -> Vec<Role> {
    match account.profile {
        AccountProfile::Admin { .. } => vec![Role::Admin],
        AccountProfile::Restaurant { .. } => vec![Role::Restaurant],
        AccountProfile::Customer { .. } => vec![Role::Customer],
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::{Account, AccountProfile, ApprovalState};

    use super::{Role, roles_for};

    fn account(profile: AccountProfile) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            profile,
            enabled: true,
            locked: false,
            login_attempts: 0,
            created_at: Utc::now(),
            last_login_at: None,
            verified_at: Some(Utc::now()),
        }
    }

    #[test]
    fn each_variant_maps_to_its_role() {
        let admin = account(AccountProfile::Admin {
            full_name: "Root".to_string(),
        });
        let restaurant = account(AccountProfile::Restaurant {
            restaurant_name: "Pho Place".to_string(),
            owner_name: "Lan".to_string(),
            approval: ApprovalState::Approved,
        });
        let customer = account(AccountProfile::Customer {
            full_name: "Ada".to_string(),
        });

        assert_eq!(roles_for(&admin), vec![Role::Admin]);
        assert_eq!(roles_for(&restaurant), vec![Role::Restaurant]);
        assert_eq!(roles_for(&customer), vec![Role::Customer]);
    }
}
