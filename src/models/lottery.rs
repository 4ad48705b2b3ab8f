use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{EligibilityType, LotteryStatus, UserLevel, lottery_entity};
use crate::error::AppError;

/// Which entry rule the member failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleKind {
    Points,
    Level,
    SpecificUser,
}

impl IneligibleKind {
    pub fn error_code(self) -> &'static str {
        match self {
            IneligibleKind::Points => "INELIGIBLE_POINTS",
            IneligibleKind::Level => "INELIGIBLE_LEVEL",
            IneligibleKind::SpecificUser => "INELIGIBLE_SPECIFIC_USER",
        }
    }
}

impl std::fmt::Display for IneligibleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibleKind::Points => write!(f, "not enough points"),
            IneligibleKind::Level => write!(f, "level too low"),
            IneligibleKind::SpecificUser => write!(f, "lottery is reserved for another member"),
        }
    }
}

/// 报名资格检查结果中的拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    Closed,
    AlreadyEntered,
    Requirement(IneligibleKind),
}

impl From<Ineligibility> for AppError {
    fn from(reason: Ineligibility) -> Self {
        match reason {
            Ineligibility::Closed => AppError::LotteryClosed,
            Ineligibility::AlreadyEntered => AppError::AlreadyEntered,
            Ineligibility::Requirement(kind) => AppError::Ineligible(kind),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLotteryRequest {
    pub title: String,
    pub prize: String,
    pub draw_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    #[serde(default = "default_eligibility_type")]
    pub eligibility_type: EligibilityType,
    #[serde(default)]
    pub min_points_to_enter: i64,
    pub min_level: Option<UserLevel>,
    pub specific_user_id: Option<i64>,
}

fn default_eligibility_type() -> EligibilityType {
    EligibilityType::All
}

/// Editable fields only; participants and draw results are never written here
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateLotteryRequest {
    pub title: Option<String>,
    pub prize: Option<String>,
    pub draw_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub eligibility_type: Option<EligibilityType>,
    pub min_points_to_enter: Option<i64>,
    pub min_level: Option<UserLevel>,
    pub specific_user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotteryResponse {
    pub id: i64,
    pub title: String,
    pub prize: String,
    pub draw_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    /// Member IDs in entry order
    pub participants: Vec<i64>,
    pub is_active: bool,
    pub status: LotteryStatus,
    pub winner_id: Option<i64>,
    pub eligibility_type: EligibilityType,
    pub min_points_to_enter: i64,
    pub min_level: Option<UserLevel>,
    pub specific_user_id: Option<i64>,
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LotteryResponse {
    pub fn new(m: lottery_entity::Model, participants: Vec<i64>) -> Self {
        Self {
            id: m.id,
            title: m.title,
            prize: m.prize,
            draw_date: m.draw_date,
            image: m.image,
            participants,
            is_active: m.is_active,
            status: m.status,
            winner_id: m.winner_id,
            eligibility_type: m.eligibility_type,
            min_points_to_enter: m.min_points_to_enter,
            min_level: m.min_level,
            specific_user_id: m.specific_user_id,
            drawn_at: m.drawn_at,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EligibilityResponse {
    pub lottery_id: i64,
    pub eligible: bool,
    /// Error code the enter endpoint would return
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl EligibilityResponse {
    pub fn new(lottery_id: i64, result: Result<(), Ineligibility>) -> Self {
        match result {
            Ok(()) => Self {
                lottery_id,
                eligible: true,
                reason: None,
                message: None,
            },
            Err(reason) => {
                let err = AppError::from(reason);
                let code = match reason {
                    Ineligibility::Closed => "LOTTERY_CLOSED",
                    Ineligibility::AlreadyEntered => "ALREADY_ENTERED",
                    Ineligibility::Requirement(kind) => kind.error_code(),
                };
                Self {
                    lottery_id,
                    eligible: false,
                    reason: Some(code.to_string()),
                    message: Some(err.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnterLotteryResponse {
    pub lottery_id: i64,
    pub points_spent: i64,
    pub balance: i64,
    pub participants_count: i64,
}

/// Draw outcome; `voided` with no winner when nobody entered
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub winner_id: Option<i64>,
    pub outcome: LotteryStatus,
    pub lottery: LotteryResponse,
}
