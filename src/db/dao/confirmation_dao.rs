use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, credential_dao::upsert_credential};
use crate::{
    db::{
        entities::{account, confirmation, prelude::Confirmation as ConfirmationEntity},
        repository::{ConfirmationRepository, Redemption},
    },
    domain::{Confirmation, ConfirmationPurpose, NewConfirmation},
};

#[derive(Clone)]
pub struct ConfirmationDao {
    db: DatabaseConnection,
}

impl DaoBase for ConfirmationDao {
    type Entity = ConfirmationEntity;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn to_domain(model: confirmation::Model) -> DaoResult<Confirmation> {
    let purpose = ConfirmationPurpose::try_from(model.purpose.as_str()).map_err(|_| {
        DaoLayerError::InvalidRow {
            entity: "confirmation",
            reason: format!("unknown purpose `{}`", model.purpose),
        }
    })?;

    Ok(Confirmation {
        id: model.id,
        account_id: model.account_id,
        key: model.key,
        purpose,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl ConfirmationRepository for ConfirmationDao {
    async fn find_by_key(&self, key: &str) -> DaoResult<Option<Confirmation>> {
        let key = key.to_string();
        self.find_one(move |query| query.filter(confirmation::Column::Key.eq(key)))
            .await?
            .map(to_domain)
            .transpose()
    }

    /// Keeps the caller's `created_at`; the TTL check reads the same clock.
    async fn save(&self, confirmation: NewConfirmation) -> DaoResult<Confirmation> {
        let created_at = confirmation.created_at.fixed_offset();
        let active = confirmation::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(created_at),
            updated_at: Set(created_at),
            account_id: Set(confirmation.account_id),
            key: Set(confirmation.key),
            purpose: Set(confirmation.purpose.as_str().to_string()),
            ..Default::default()
        };
        to_domain(active.insert(&self.db).await?)
    }

    async fn delete(&self, key: &str) -> DaoResult<bool> {
        let result = confirmation::Entity::delete_many()
            .filter(confirmation::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_for_account(
        &self,
        account_id: Uuid,
        purpose: Option<ConfirmationPurpose>,
    ) -> DaoResult<u64> {
        let mut query =
            confirmation::Entity::delete_many().filter(confirmation::Column::AccountId.eq(account_id));
        if let Some(purpose) = purpose {
            query = query.filter(confirmation::Column::Purpose.eq(purpose.as_str()));
        }
        Ok(query.exec(&self.db).await?.rows_affected)
    }

    async fn redeem(&self, redemption: Redemption) -> DaoResult<bool> {
        let txn = self.db.begin().await?;

        let spent = confirmation::Entity::delete_many()
            .filter(confirmation::Column::Key.eq(redemption.key.as_str()))
            .filter(confirmation::Column::AccountId.eq(redemption.account_id))
            .exec(&txn)
            .await?;
        if spent.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        upsert_credential(&txn, redemption.account_id, &redemption.password_hash).await?;

        if let Some(at) = redemption.activate_at {
            let at = at.fixed_offset();
            account::Entity::update_many()
                .col_expr(account::Column::Enabled, Expr::value(true))
                .col_expr(account::Column::VerifiedAt, Expr::value(at))
                .col_expr(account::Column::UpdatedAt, Expr::value(at))
                .filter(account::Column::Id.eq(redemption.account_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(true)
    }
}
