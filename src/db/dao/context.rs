use sea_orm::DatabaseConnection;

use super::{AccountDao, ConfirmationDao, CredentialDao, DaoBase};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn accounts(&self) -> AccountDao {
        DaoBase::new(&self.db)
    }

    pub fn credentials(&self) -> CredentialDao {
        DaoBase::new(&self.db)
    }

    pub fn confirmations(&self) -> ConfirmationDao {
        DaoBase::new(&self.db)
    }
}
