use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::class_entity;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateClassRequest {
    #[schema(example = "Pilates for beginners")]
    pub title: String,
    pub instructor: Option<String>,
    #[schema(example = "050-1234567")]
    pub contact_phone: Option<String>,
    #[schema(example = "Sunday")]
    pub day: Option<String>,
    #[schema(example = "18:30")]
    pub time: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[schema(example = "25-40")]
    pub age_group: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateClassRequest {
    pub title: Option<String>,
    pub instructor: Option<String>,
    pub contact_phone: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub price: Option<i64>,
    pub age_group: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassResponse {
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
    pub created_at: DateTime<Utc>,
}

impl From<class_entity::Model> for ClassResponse {
    fn from(m: class_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            instructor: m.instructor,
            contact_phone: m.contact_phone,
            day: m.day,
            time: m.time,
            location: m.location,
            price: m.price,
            age_group: m.age_group,
            image: m.image,
            category: m.category,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}
