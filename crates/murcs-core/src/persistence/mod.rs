//! Storage boundary for relational models.
//!
//! [`PersistenceLoader`] decouples where a model is stored from how it is
//! represented in memory. Every backend stores the same JSON document
//! (see [`crate::schema`]) and reports the same error conditions.

use crate::error::{PersistenceError, PersistenceResult};
use crate::model::RelationalModel;

pub mod file;
pub mod memory;

pub use file::FilePersistenceLoader;
pub use memory::MemoryPersistenceLoader;

/// A backend that can load, save, list and delete named models.
pub trait PersistenceLoader {
    /// Load the model stored under `name`.
    ///
    /// Fails with [`PersistenceError::NotFound`] if nothing is stored under that
    /// name and [`PersistenceError::Corrupt`] if the stored data does not form
    /// a valid graph.
    fn load_model(&self, name: &str) -> PersistenceResult<RelationalModel>;

    /// Store `model` under [`RelationalModel::name`], replacing any previous
    /// version atomically.
    fn save_model(&self, model: &RelationalModel) -> PersistenceResult<()>;

    /// Names of all stored models, sorted lexicographically.
    fn model_list(&self) -> PersistenceResult<Vec<String>>;

    /// Delete a stored model. Returns whether anything was removed.
    fn delete_model(&self, name: &str) -> PersistenceResult<bool>;
}

impl<L: PersistenceLoader + ?Sized> PersistenceLoader for Box<L> {
    fn load_model(&self, name: &str) -> PersistenceResult<RelationalModel> {
        (**self).load_model(name)
    }

    fn save_model(&self, model: &RelationalModel) -> PersistenceResult<()> {
        (**self).save_model(model)
    }

    fn model_list(&self) -> PersistenceResult<Vec<String>> {
        (**self).model_list()
    }

    fn delete_model(&self, name: &str) -> PersistenceResult<bool> {
        (**self).delete_model(name)
    }
}

/// Reject names that cannot safely be used as a storage key.
pub fn validate_model_name(name: &str) -> PersistenceResult<()> {
    let invalid = name.trim().is_empty()
        || name != name.trim()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0', ':'])
        || name.contains("..");
    if invalid {
        return Err(PersistenceError::InvalidName(name.to_string()));
    }
    Ok(())
}
