use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 礼品码兑换记录，(gift_code_id, user_id) 唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "gift_code_redemptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub gift_code_id: i64,
    pub user_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
