use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 课程：每周固定时间的小组活动，day / time 为展示用文本（如 "Sunday" / "18:30"）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub instructor: Option<String>,
    pub contact_phone: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub price: i64,
    pub age_group: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
