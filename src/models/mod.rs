pub mod class;
pub mod event;
pub mod gift_code;
pub mod lottery;
pub mod pagination;
pub mod points;
pub mod settings;
pub mod user;

pub use class::*;
pub use event::*;
pub use gift_code::*;
pub use lottery::*;
pub use pagination::*;
pub use points::*;
pub use settings::*;
pub use user::*;
