use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult, HasIdActiveModel, TimestampedActiveModel};
use crate::{
    db::{
        entities::{credential, prelude::Credential as CredentialEntity},
        repository::CredentialRepository,
    },
    domain::Credential,
};

#[derive(Clone)]
pub struct CredentialDao {
    db: DatabaseConnection,
}

impl DaoBase for CredentialDao {
    type Entity = CredentialEntity;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub(crate) fn to_domain(model: credential::Model) -> Credential {
    Credential {
        account_id: model.account_id,
        password_hash: model.password_hash,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Replaces the hash of an existing credential or inserts the first one.
/// Generic over the connection so redemption can run it inside its transaction.
pub(crate) async fn upsert_credential<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    password_hash: &str,
) -> DaoResult<credential::Model> {
    let now = Utc::now().fixed_offset();
    let existing = credential::Entity::find()
        .filter(credential::Column::AccountId.eq(account_id))
        .one(conn)
        .await?;

    let model = match existing {
        Some(model) => {
            let mut active = model.into_active_model();
            active.password_hash = Set(password_hash.to_string());
            active.set_updated_at(now);
            active.update(conn).await?
        }
        None => {
            let mut active = credential::ActiveModel {
                account_id: Set(account_id),
                password_hash: Set(password_hash.to_string()),
                ..Default::default()
            };
            active.set_id(Uuid::new_v4());
            active.set_created_at(now);
            active.set_updated_at(now);
            active.insert(conn).await?
        }
    };

    Ok(model)
}

#[async_trait]
impl CredentialRepository for CredentialDao {
    async fn find_by_account_id(&self, account_id: Uuid) -> DaoResult<Option<Credential>> {
        Ok(self
            .find_one(move |query| query.filter(credential::Column::AccountId.eq(account_id)))
            .await?
            .map(to_domain))
    }

    async fn save(&self, account_id: Uuid, password_hash: &str) -> DaoResult<Credential> {
        let model = upsert_credential(&self.db, account_id, password_hash).await?;
        Ok(to_domain(model))
    }

    async fn delete_by_account_id(&self, account_id: Uuid) -> DaoResult<u64> {
        let result = credential::Entity::delete_many()
            .filter(credential::Column::AccountId.eq(account_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
