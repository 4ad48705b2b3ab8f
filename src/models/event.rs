use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::event_entity;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub price: i64,
    pub image: Option<String>,
    #[serde(default)]
    pub is_hero: bool,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub is_hero: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price: i64,
    pub image: Option<String>,
    pub is_hero: bool,
    pub attendees_count: i64,
    /// Mean of the members' 1-5 ratings; null before the first rating
    pub average_rating: Option<f64>,
    pub ratings_count: i64,
}

impl From<event_entity::Model> for EventResponse {
    fn from(m: event_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            date: m.date,
            location: m.location,
            category: m.category,
            price: m.price,
            image: m.image,
            is_hero: m.is_hero,
            attendees_count: 0, // 需要单独统计
            average_rating: None,
            ratings_count: 0,
        }
    }
}

/// Points outcome of joining or sharing an event
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventPointsResponse {
    pub event_id: i64,
    /// 0 for repeated shares
    pub points_awarded: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LikeEventResponse {
    pub event_id: i64,
    pub liked: bool,
    pub liked_event_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateEventRequest {
    /// 1 to 5; rating again replaces the previous value
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventRatingResponse {
    pub event_id: i64,
    pub rating: i32,
    pub average_rating: Option<f64>,
    pub ratings_count: i64,
}
