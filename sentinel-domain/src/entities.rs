// Domain entities

pub mod alert;
pub mod balance;
pub mod runtime_config;
pub mod sentinel_status;

pub use alert::*;
pub use balance::*;
pub use runtime_config::*;
pub use sentinel_status::*;
