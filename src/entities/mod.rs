pub mod app_settings;
pub mod classes;
pub mod event_attendees;
pub mod event_ratings;
pub mod event_shares;
pub mod events;
pub mod gift_code_redemptions;
pub mod gift_codes;
pub mod lotteries;
pub mod lottery_participants;
pub mod point_transactions;
pub mod user_liked_events;
pub mod users;

pub use app_settings as app_setting_entity;
pub use classes as class_entity;
pub use event_attendees as event_attendee_entity;
pub use event_ratings as event_rating_entity;
pub use event_shares as event_share_entity;
pub use events as event_entity;
pub use gift_code_redemptions as gift_code_redemption_entity;
pub use gift_codes as gift_code_entity;
pub use lotteries as lottery_entity;
pub use lottery_participants as lottery_participant_entity;
pub use point_transactions as point_transaction_entity;
pub use user_liked_events as user_liked_event_entity;
pub use users as user_entity;

pub use lotteries::{EligibilityType, LotteryStatus};
pub use point_transactions::PointsReason;
pub use users::{CommunicationPref, UserLevel};
