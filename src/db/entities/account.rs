use sea_orm::entity::prelude::*;

/// One table for every account variant; `kind` selects which nullable
/// profile columns are meaningful.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub email: String,
    pub kind: String,
    pub full_name: Option<String>,
    pub restaurant_name: Option<String>,
    pub owner_name: Option<String>,
    pub approval: Option<String>,
    pub enabled: bool,
    pub locked: bool,
    pub login_attempts: i32,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub verified_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(has_one)]
    pub credential: HasOne<super::credential::Entity>,
    #[sea_orm(has_many)]
    pub confirmations: HasMany<super::confirmation::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

crate::db::dao::base_traits::base_entity!();
