use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽奖参与名单
/// - (lottery_id, user_id) 唯一
/// - 开奖后不再写入（报名会先对 lotteries 做 is_active 条件更新）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "lottery_participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lottery_id: i64,
    pub user_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
