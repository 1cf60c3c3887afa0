//! Error types shared across the model, persistence and manager layers.

use crate::model::EntityKind;
use std::io;

/// Errors raised synchronously by [`crate::model::RelationalModel`] mutators.
///
/// A mutator that returns an error has left the model unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
    #[error("invalid {kind} name: {name:?}")]
    InvalidName { kind: EntityKind, name: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by [`crate::persistence::PersistenceLoader`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("model not found: {name}")]
    NotFound { name: String },
    #[error("model {name} is corrupt: {reason}")]
    Corrupt { name: String, reason: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid model name: {0:?}")]
    InvalidName(String),
}

impl PersistenceError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn corrupt(name: &str, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors raised by [`crate::manager::PersistenceManager`].
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("persistence manager has no loader configured")]
    Unconfigured,
    #[error("persistence manager already has a loader configured")]
    AlreadyConfigured,
    #[error("no model is currently active")]
    NoActiveModel,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type ManagerResult<T> = Result<T, ManagerError>;
