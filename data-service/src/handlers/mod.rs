pub mod data;
pub mod health;

pub use data::{method_not_allowed, read_document, write_document};
pub use health::{health_check, metrics_endpoint};
