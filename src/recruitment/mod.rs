//! Recruitment domain: records, request DTOs and status transition rules

pub mod models;
pub mod requests;
pub mod transitions;

pub use models::*;
pub use requests::*;
