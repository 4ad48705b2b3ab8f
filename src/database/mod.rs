pub mod connection;
#[cfg(test)]
pub(crate) mod fixtures;

pub use connection::*;
