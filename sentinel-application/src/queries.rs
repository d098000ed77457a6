pub mod alert_queries;
pub mod sentinel_queries;
