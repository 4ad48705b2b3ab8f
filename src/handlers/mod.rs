pub mod admin;
pub mod auth;
pub mod class;
pub mod event;
pub mod gift_code;
pub mod lottery;
pub mod user;

pub use admin::admin_config;
pub use auth::auth_config;
pub use class::class_config;
pub use event::event_config;
pub use gift_code::gift_code_config;
pub use lottery::lottery_config;
pub use user::user_config;
