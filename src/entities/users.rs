use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 用户等级，按 rank 全序比较（不是按字符串比较）
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    #[sea_orm(string_value = "beginner")]
    Beginner,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "leader")]
    Leader,
    #[sea_orm(string_value = "creator")]
    Creator,
    #[sea_orm(string_value = "ambassador")]
    Ambassador,
}

impl UserLevel {
    pub fn rank(self) -> u8 {
        match self {
            UserLevel::Beginner => 0,
            UserLevel::Active => 1,
            UserLevel::Leader => 2,
            UserLevel::Creator => 3,
            UserLevel::Ambassador => 4,
        }
    }
}

impl PartialOrd for UserLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Default for UserLevel {
    fn default() -> Self {
        UserLevel::Beginner
    }
}

impl std::fmt::Display for UserLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserLevel::Beginner => write!(f, "beginner"),
            UserLevel::Active => write!(f, "active"),
            UserLevel::Leader => write!(f, "leader"),
            UserLevel::Creator => write!(f, "creator"),
            UserLevel::Ambassador => write!(f, "ambassador"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum CommunicationPref {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "whatsapp")]
    Whatsapp,
    #[sea_orm(string_value = "sms")]
    Sms,
    #[sea_orm(string_value = "print")]
    Print,
}

impl Default for CommunicationPref {
    fn default() -> Self {
        CommunicationPref::Whatsapp
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub communication_pref: CommunicationPref,
    pub avatar: Option<String>,
    /// 积分余额，只能通过 PointsService 增减
    pub points: i64,
    pub level: UserLevel,
    pub is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
