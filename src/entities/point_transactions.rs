use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum PointsReason {
    #[sea_orm(string_value = "register")]
    Register,
    #[sea_orm(string_value = "event_join")]
    EventJoin,
    #[sea_orm(string_value = "share")]
    Share,
    #[sea_orm(string_value = "gift")]
    Gift,
    #[sea_orm(string_value = "admin_grant")]
    AdminGrant,
    #[sea_orm(string_value = "lottery_entry")]
    LotteryEntry,
}

impl std::fmt::Display for PointsReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointsReason::Register => write!(f, "register"),
            PointsReason::EventJoin => write!(f, "event_join"),
            PointsReason::Share => write!(f, "share"),
            PointsReason::Gift => write!(f, "gift"),
            PointsReason::AdminGrant => write!(f, "admin_grant"),
            PointsReason::LotteryEntry => write!(f, "lottery_entry"),
        }
    }
}

/// 积分流水
/// amount 为有符号数：发放为正，抽奖报名扣除为负
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "point_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub balance_after: i64,
    pub reason: PointsReason,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
