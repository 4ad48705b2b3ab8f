use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const KEY_POINTS_PER_REGISTER: &str = "points_per_register";
pub const KEY_POINTS_PER_EVENT_JOIN: &str = "points_per_event_join";
pub const KEY_POINTS_PER_SHARE: &str = "points_per_share";

pub const DEFAULT_POINTS_PER_REGISTER: i64 = 50;
pub const DEFAULT_POINTS_PER_EVENT_JOIN: i64 = 10;
pub const DEFAULT_POINTS_PER_SHARE: i64 = 5;

/// Points awarded per action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PointsConfig {
    pub points_per_register: i64,
    pub points_per_event_join: i64,
    pub points_per_share: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            points_per_register: DEFAULT_POINTS_PER_REGISTER,
            points_per_event_join: DEFAULT_POINTS_PER_EVENT_JOIN,
            points_per_share: DEFAULT_POINTS_PER_SHARE,
        }
    }
}

impl PointsConfig {
    pub fn entries(&self) -> [(&'static str, i64); 3] {
        [
            (KEY_POINTS_PER_REGISTER, self.points_per_register),
            (KEY_POINTS_PER_EVENT_JOIN, self.points_per_event_join),
            (KEY_POINTS_PER_SHARE, self.points_per_share),
        ]
    }

    /// 用数据库中读到的 key/value 覆盖默认值，未知 key 忽略
    pub fn apply(&mut self, key: &str, value: i64) {
        match key {
            KEY_POINTS_PER_REGISTER => self.points_per_register = value,
            KEY_POINTS_PER_EVENT_JOIN => self.points_per_event_join = value,
            KEY_POINTS_PER_SHARE => self.points_per_share = value,
            _ => log::warn!("Ignoring unknown settings key: {key}"),
        }
    }
}

/// Partial update; omitted fields keep their value
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdatePointsConfigRequest {
    pub points_per_register: Option<i64>,
    pub points_per_event_join: Option<i64>,
    pub points_per_share: Option<i64>,
}

impl UpdatePointsConfigRequest {
    pub fn entries(&self) -> Vec<(&'static str, i64)> {
        [
            (KEY_POINTS_PER_REGISTER, self.points_per_register),
            (KEY_POINTS_PER_EVENT_JOIN, self.points_per_event_join),
            (KEY_POINTS_PER_SHARE, self.points_per_share),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}
