//! Core types, persistence and reporting for MURCS project models.
//!
//! Provides the relational object graph ([`model::RelationalModel`]) of a project's
//! skills, people and teams, the pluggable [`persistence::PersistenceLoader`]
//! storage boundary with file and in-memory backends, the
//! [`manager::PersistenceManager`] context that tracks the active model, and
//! deterministic XML-style reports.

pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod persistence;
pub mod report;
pub mod schema;
