//! In-process persistence backend.
//!
//! Keeps serialized documents in memory and runs them through the same JSON
//! encode/decode path as the file backend, so load errors behave identically.

use super::{PersistenceLoader, validate_model_name};
use crate::error::{PersistenceError, PersistenceResult};
use crate::model::RelationalModel;
use crate::schema;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Stores serialized models in a map keyed by name.
#[derive(Debug, Default)]
pub struct MemoryPersistenceLoader {
    documents: RefCell<BTreeMap<String, String>>,
}

impl MemoryPersistenceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw document text under `name`, bypassing serialization.
    pub fn insert_raw(&self, name: impl Into<String>, contents: impl Into<String>) {
        self.documents
            .borrow_mut()
            .insert(name.into(), contents.into());
    }

    /// Raw document text stored under `name`.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.documents.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }
}

impl PersistenceLoader for MemoryPersistenceLoader {
    fn load_model(&self, name: &str) -> PersistenceResult<RelationalModel> {
        validate_model_name(name)?;
        let json = self
            .raw(name)
            .ok_or_else(|| PersistenceError::NotFound {
                name: name.to_string(),
            })?;
        schema::from_json(name, &json)
    }

    fn save_model(&self, model: &RelationalModel) -> PersistenceResult<()> {
        validate_model_name(model.name())?;
        let json = schema::to_json(model)?;
        self.insert_raw(model.name(), json);
        Ok(())
    }

    fn model_list(&self) -> PersistenceResult<Vec<String>> {
        Ok(self.documents.borrow().keys().cloned().collect())
    }

    fn delete_model(&self, name: &str) -> PersistenceResult<bool> {
        validate_model_name(name)?;
        Ok(self.documents.borrow_mut().remove(name).is_some())
    }
}
