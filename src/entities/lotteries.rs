use super::UserLevel;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum EligibilityType {
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "points")]
    Points,
    #[sea_orm(string_value = "level")]
    Level,
    #[sea_orm(string_value = "specific_user")]
    SpecificUser,
}

impl std::fmt::Display for EligibilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EligibilityType::All => write!(f, "all"),
            EligibilityType::Points => write!(f, "points"),
            EligibilityType::Level => write!(f, "level"),
            EligibilityType::SpecificUser => write!(f, "specific_user"),
        }
    }
}

/// 抽奖状态机: Open -> Drawn | Voided，终态不可逆
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum LotteryStatus {
    #[sea_orm(string_value = "open")]
    Open,
    /// 已开奖，winner_id 已写入
    #[sea_orm(string_value = "drawn")]
    Drawn,
    /// 无人参与，作废
    #[sea_orm(string_value = "voided")]
    Voided,
}

impl std::fmt::Display for LotteryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LotteryStatus::Open => write!(f, "open"),
            LotteryStatus::Drawn => write!(f, "drawn"),
            LotteryStatus::Voided => write!(f, "voided"),
        }
    }
}

/// 抽奖实体
/// 说明:
/// - is_active 与 status 同步: Open <=> is_active = true
/// - winner_id 只由开奖写入一次
/// - 参与名单见 lottery_participants
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "lotteries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub prize: String,
    pub draw_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub is_active: bool,
    pub status: LotteryStatus,
    pub winner_id: Option<i64>,
    pub eligibility_type: EligibilityType,
    /// 报名门槛积分（points 类型时同时作为报名扣除的积分）
    pub min_points_to_enter: i64,
    pub min_level: Option<UserLevel>,
    pub specific_user_id: Option<i64>,
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 是否已经进入终态（已开奖或作废）
    pub fn is_finalized(&self) -> bool {
        self.status != LotteryStatus::Open || self.winner_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
