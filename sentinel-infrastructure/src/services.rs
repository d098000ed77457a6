pub mod alert_notifier;
pub mod scheduler;

pub use alert_notifier::*;
pub use scheduler::*;
