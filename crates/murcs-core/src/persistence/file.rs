//! File-backed persistence: one pretty-printed JSON file per model.
//!
//! A model named `acme` lives at `<directory>/acme.<extension>`. Saves go
//! through a temporary file in the same directory that is renamed over the
//! target, so a reader never observes a half-written model.

use super::{PersistenceLoader, validate_model_name};
use crate::error::{PersistenceError, PersistenceResult};
use crate::model::RelationalModel;
use crate::schema;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Extension used for stored models when none is configured.
pub const DEFAULT_EXTENSION: &str = "project";

/// Stores each model as a JSON file in a working directory.
#[derive(Debug, Clone)]
pub struct FilePersistenceLoader {
    directory: PathBuf,
    extension: String,
}

impl FilePersistenceLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Use a different file extension (with or without the leading dot).
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Point future lookups at another directory.
    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directory = directory.into();
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file backing the model called `name`.
    pub fn model_path(&self, name: &str) -> PersistenceResult<PathBuf> {
        validate_model_name(name)?;
        Ok(self.directory.join(format!("{}.{}", name, self.extension)))
    }
}

impl PersistenceLoader for FilePersistenceLoader {
    fn load_model(&self, name: &str) -> PersistenceResult<RelationalModel> {
        let path = self.model_path(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(err) => {
                return Err(PersistenceError::io(
                    format!("failed to read model from {}", path.display()),
                    err,
                ));
            }
        };
        let model = schema::from_bytes(name, &bytes)?;
        debug!(model = name, path = %path.display(), "loaded model");
        Ok(model)
    }

    fn save_model(&self, model: &RelationalModel) -> PersistenceResult<()> {
        let path = self.model_path(model.name())?;
        fs::create_dir_all(&self.directory).map_err(|err| {
            PersistenceError::io(
                format!("failed to create model directory {}", self.directory.display()),
                err,
            )
        })?;

        let json = schema::to_json(model)?;
        let write_context = || format!("failed to write model to {}", path.display());
        let mut staged = NamedTempFile::new_in(&self.directory)
            .map_err(|err| PersistenceError::io(write_context(), err))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| PersistenceError::io(write_context(), err))?;
        staged
            .persist(&path)
            .map_err(|err| PersistenceError::io(write_context(), err.error))?;

        info!(model = model.name(), path = %path.display(), bytes = json.len(), "saved model");
        Ok(())
    }

    fn model_list(&self) -> PersistenceResult<Vec<String>> {
        let list_context = || format!("failed to list models in {}", self.directory.display());
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PersistenceError::io(list_context(), err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|err| PersistenceError::io(list_context(), err))?
                .path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str())
            {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if validate_model_name(stem).is_ok() => names.push(stem.to_string()),
                _ => debug!(path = %path.display(), "skipping file with unusable model name"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_model(&self, name: &str) -> PersistenceResult<bool> {
        let path = self.model_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(model = name, path = %path.display(), "deleted model");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(PersistenceError::io(
                format!("failed to delete model {}", path.display()),
                err,
            )),
        }
    }
}
