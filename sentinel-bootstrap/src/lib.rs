pub mod context;
pub mod lifecycle;

pub use lifecycle::{run_once, run_standalone};
