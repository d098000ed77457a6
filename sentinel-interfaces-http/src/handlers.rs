pub mod ops_handlers;
pub mod sentinel_handlers;

pub use ops_handlers::*;
pub use sentinel_handlers::*;
