use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::gift_code_entity;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGiftCodeRequest {
    /// Generated as an 8-character uppercase alphanumeric code when omitted
    #[schema(example = "WELCOME2026")]
    pub code: Option<String>,
    pub points: i64,
    pub max_uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GiftCodeResponse {
    pub id: i64,
    pub code: String,
    pub points: i64,
    pub max_uses: i32,
    pub used_count: i32,
    pub remaining_uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<gift_code_entity::Model> for GiftCodeResponse {
    fn from(m: gift_code_entity::Model) -> Self {
        Self {
            remaining_uses: m.remaining_uses(),
            id: m.id,
            code: m.code,
            points: m.points,
            max_uses: m.max_uses,
            used_count: m.used_count,
            expires_at: m.expires_at,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateGiftCodeResponse {
    pub gift_code: GiftCodeResponse,
    /// Link members can open to redeem the code
    pub redeem_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedeemGiftCodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedeemGiftCodeResponse {
    pub code: String,
    pub points_awarded: i64,
    pub balance: i64,
}
