pub mod code_generator;
pub mod contact;
pub mod jwt;
pub mod password;

pub use code_generator::generate_gift_code;
pub use contact::*;
pub use jwt::*;
pub use password::*;
