use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{PointsReason, point_transaction_entity};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PointsHistoryQuery {
    /// Page number (default 1)
    pub page: Option<u32>,
    /// Page size (default 20)
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointTransactionResponse {
    pub id: i64,
    /// Positive for grants, negative for deductions
    pub amount: i64,
    pub balance_after: i64,
    pub reason: PointsReason,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<point_transaction_entity::Model> for PointTransactionResponse {
    fn from(m: point_transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            amount: m.amount,
            balance_after: m.balance_after,
            reason: m.reason,
            description: m.description,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Manual adjustment: positive grants, negative deducts (never below zero)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminAdjustPointsRequest {
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointsBalanceResponse {
    pub user_id: i64,
    pub amount: i64,
    pub balance: i64,
}
