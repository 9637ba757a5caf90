//! Store error taxonomy

use crate::recruitment::Entity;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A key required by the mutation does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A status change outside the allowed transition table
    #[error("invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    pub fn not_found<T: Entity>(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: T::KIND,
            id: id.into(),
        }
    }

    pub fn invalid_transition<T: Entity>(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            entity: T::KIND,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
