use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{CommunicationPref, UserLevel, user_entity};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "דנה כהן")]
    pub name: String,
    #[schema(example = "dana@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
    #[schema(example = "050-1234567")]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub communication_pref: Option<CommunicationPref>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "dana@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub communication_pref: Option<CommunicationPref>,
    pub avatar: Option<String>,
}

/// Admin change of a member's level or admin flag
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminUpdateUserRequest {
    pub level: Option<UserLevel>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub communication_pref: CommunicationPref,
    pub avatar: Option<String>,
    pub points: i64,
    pub level: UserLevel,
    pub is_admin: bool,
    pub liked_event_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            communication_pref: user.communication_pref,
            avatar: user.avatar,
            points: user.points,
            level: user.level,
            is_admin: user.is_admin,
            liked_event_ids: Vec::new(), // 需要单独查询
            created_at: user.created_at.unwrap_or_else(Utc::now),
        }
    }
}
