pub mod auth_service;
pub mod class_service;
pub mod eligibility;
pub mod event_service;
pub mod gift_code_service;
pub mod lottery_service;
pub mod points_service;
pub mod settings_service;
pub mod user_service;

pub use auth_service::*;
pub use class_service::*;
pub use event_service::EventService;
pub use gift_code_service::*;
pub use lottery_service::*;
pub use points_service::*;
pub use settings_service::*;
pub use user_service::*;
