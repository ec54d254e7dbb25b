use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::{
    db::{
        entities::{account, confirmation, credential, prelude::Account as AccountEntity},
        repository::AccountRepository,
    },
    domain::{Account, AccountKind, AccountProfile, ApprovalState, NewAccount},
};

#[derive(Clone)]
pub struct AccountDao {
    db: DatabaseConnection,
}

impl DaoBase for AccountDao {
    type Entity = AccountEntity;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn invalid_row(reason: String) -> DaoLayerError {
    DaoLayerError::InvalidRow {
        entity: "account",
        reason,
    }
}

/// Resolves the variant once; an unknown `kind` is a configuration problem,
/// not an account without roles.
fn to_domain(model: account::Model) -> DaoResult<Account> {
    let kind = AccountKind::try_from(model.kind.as_str())
        .map_err(|_| invalid_row(format!("unknown account kind `{}`", model.kind)))?;

    let profile = match kind {
        AccountKind::Admin => AccountProfile::Admin {
            full_name: model.full_name.unwrap_or_default(),
        },
        AccountKind::Customer => AccountProfile::Customer {
            full_name: model.full_name.unwrap_or_default(),
        },
        AccountKind::Restaurant => {
            let raw = model
                .approval
                .ok_or_else(|| invalid_row(format!("restaurant {} has no approval", model.id)))?;
            let approval = ApprovalState::try_from(raw.as_str())
                .map_err(|_| invalid_row(format!("unknown approval state `{raw}`")))?;
            AccountProfile::Restaurant {
                restaurant_name: model.restaurant_name.unwrap_or_default(),
                owner_name: model.owner_name.unwrap_or_default(),
                approval,
            }
        }
    };

    Ok(Account {
        id: model.id,
        email: model.email,
        profile,
        enabled: model.enabled,
        locked: model.locked,
        login_attempts: model.login_attempts,
        created_at: model.created_at.with_timezone(&Utc),
        last_login_at: model.last_login_at.map(|at| at.with_timezone(&Utc)),
        verified_at: model.verified_at.map(|at| at.with_timezone(&Utc)),
    })
}

fn apply_profile(active: &mut account::ActiveModel, profile: &AccountProfile) {
    active.kind = Set(profile.kind().as_str().to_string());
    match profile {
        AccountProfile::Admin { full_name } | AccountProfile::Customer { full_name } => {
            active.full_name = Set(Some(full_name.clone()));
            active.restaurant_name = Set(None);
            active.owner_name = Set(None);
            active.approval = Set(None);
        }
        AccountProfile::Restaurant {
            restaurant_name,
            owner_name,
            approval,
        } => {
            active.full_name = Set(None);
            active.restaurant_name = Set(Some(restaurant_name.clone()));
            active.owner_name = Set(Some(owner_name.clone()));
            active.approval = Set(Some(approval.as_str().to_string()));
        }
    }
}

#[async_trait]
impl AccountRepository for AccountDao {
    async fn find_by_email(&self, email: &str) -> DaoResult<Option<Account>> {
        let email = email.to_string();
        self.find_one(move |query| query.filter(account::Column::Email.eq(email)))
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<Account>> {
        self.get_by_id(id).await?.map(to_domain).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        let email = email.to_string();
        Ok(self
            .find_one(move |query| query.filter(account::Column::Email.eq(email)))
            .await?
            .is_some())
    }

    async fn insert(&self, account: NewAccount) -> DaoResult<Account> {
        let mut active = account::ActiveModel {
            email: Set(account.email),
            enabled: Set(account.enabled),
            locked: Set(false),
            login_attempts: Set(0),
            last_login_at: Set(None),
            verified_at: Set(account.verified_at.map(|at| at.fixed_offset())),
            ..Default::default()
        };
        apply_profile(&mut active, &account.profile);

        to_domain(self.create(active).await?)
    }

    async fn save(&self, account: &Account) -> DaoResult<Account> {
        let id = account.id;
        let account = account.clone();
        let model = self
            .update(id, move |active| {
                active.email = Set(account.email);
                active.enabled = Set(account.enabled);
                active.locked = Set(account.locked);
                active.login_attempts = Set(account.login_attempts);
                active.last_login_at = Set(account.last_login_at.map(|at| at.fixed_offset()));
                active.verified_at = Set(account.verified_at.map(|at| at.fixed_offset()));
                apply_profile(active, &account.profile);
            })
            .await?;

        to_domain(model)
    }

    async fn delete(&self, id: Uuid) -> DaoResult<bool> {
        let txn = self.db.begin().await?;

        confirmation::Entity::delete_many()
            .filter(confirmation::Column::AccountId.eq(id))
            .exec(&txn)
            .await?;
        credential::Entity::delete_many()
            .filter(credential::Column::AccountId.eq(id))
            .exec(&txn)
            .await?;
        let removed = account::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(removed.rows_affected > 0)
    }
}
