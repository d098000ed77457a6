// Domain value objects
pub mod alert_rule;
pub mod identifiers;

pub use alert_rule::*;
pub use identifiers::*;
