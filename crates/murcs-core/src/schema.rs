//! Stored document shape, version handling and JSON encoding for relational models.
//!
//! Cross-references are stored by name. Decoding rebuilds the entity tables and
//! then validates every reference against them, so a document that parses but
//! points at a missing team, person or skill is rejected as corrupt.

use crate::error::{PersistenceError, PersistenceResult};
use crate::model::{Person, Project, RelationalModel, Skill, Team};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;

pub const CURRENT_VERSION: &str = "1.0.0";

/// On-disk representation of a [`RelationalModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    pub version: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl ModelDocument {
    /// Snapshot a model, stamping the current time.
    pub fn from_model(model: &RelationalModel) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            name: model.name().to_string(),
            saved_at: Some(Utc::now()),
            project: model.project().cloned(),
            teams: model.teams().to_vec(),
            people: model.people().to_vec(),
            skills: model.skills().to_vec(),
        }
    }

    /// Rebuild and validate the model. The returned model is named `name`,
    /// which is the key it was stored under.
    pub fn into_model(self, name: &str) -> PersistenceResult<RelationalModel> {
        validate_version(&self).map_err(|reason| PersistenceError::corrupt(name, reason))?;
        let model = RelationalModel::from_parts(
            name.to_string(),
            self.project,
            self.teams,
            self.people,
            self.skills,
        );
        model
            .validate()
            .map_err(|err| PersistenceError::corrupt(name, err.to_string()))?;
        Ok(model)
    }
}

/// Check the document was written by a compatible schema version.
pub fn validate_version(document: &ModelDocument) -> Result<(), String> {
    if document.version != CURRENT_VERSION {
        return Err(format!(
            "schema version mismatch: expected {}, found {}",
            CURRENT_VERSION, document.version
        ));
    }
    Ok(())
}

/// Serialize a model to a pretty-printed JSON string.
pub fn to_json(model: &RelationalModel) -> PersistenceResult<String> {
    serde_json::to_string_pretty(&ModelDocument::from_model(model)).map_err(|err| {
        PersistenceError::io(
            format!("failed to serialize model {}", model.name()),
            io::Error::other(err),
        )
    })
}

/// Deserialize and validate a model stored under `name`.
pub fn from_json(name: &str, json: &str) -> PersistenceResult<RelationalModel> {
    let document: ModelDocument = serde_json::from_str(json)
        .map_err(|err| PersistenceError::corrupt(name, format!("invalid JSON: {err}")))?;
    document.into_model(name)
}

/// Decode raw stored bytes, treating invalid UTF-8 as corruption.
pub fn from_bytes(name: &str, bytes: &[u8]) -> PersistenceResult<RelationalModel> {
    let json = std::str::from_utf8(bytes)
        .map_err(|err| PersistenceError::corrupt(name, format!("invalid UTF-8: {err}")))?;
    from_json(name, json)
}
