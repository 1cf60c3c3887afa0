//! The active-model context shared by the application's front ends.
//!
//! A [`PersistenceManager`] is created once at startup and passed by reference
//! to whatever needs the current model. It owns the configured
//! [`PersistenceLoader`], the currently active [`RelationalModel`] and a list of
//! listeners that are told, synchronously and in registration order, whenever
//! the active model is replaced or edited.
//!
//! Listeners only ever see the event, never the manager, and every mutating
//! method takes `&mut self`, so a listener cannot re-enter the manager while a
//! notification is being delivered.

use crate::error::{ManagerError, ManagerResult, ModelResult};
use crate::model::RelationalModel;
use crate::persistence::{PersistenceLoader, validate_model_name};
use tracing::{debug, info};

/// A change to the active model, delivered to listeners.
#[derive(Debug, Clone, Copy)]
pub enum ModelEvent<'a> {
    /// The active model was replaced. Listeners should drop anything they
    /// hold from `old` before attaching to `new`.
    Replaced {
        old: Option<&'a RelationalModel>,
        new: &'a RelationalModel,
    },
    /// The active model was edited in place.
    Edited { model: &'a RelationalModel },
}

/// Handle returned by [`PersistenceManager::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ModelEvent<'_>)>;

/// Coordinates the active loader and the active model.
#[derive(Default)]
pub struct PersistenceManager {
    loader: Option<Box<dyn PersistenceLoader>>,
    current: Option<RelationalModel>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl PersistenceManager {
    /// Create a manager with no loader. [`PersistenceManager::configure`] must
    /// be called before any storage operation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(loader: impl PersistenceLoader + 'static) -> Self {
        Self {
            loader: Some(Box::new(loader)),
            ..Self::default()
        }
    }

    /// Install the loader. Allowed exactly once.
    pub fn configure(&mut self, loader: impl PersistenceLoader + 'static) -> ManagerResult<()> {
        if self.loader.is_some() {
            return Err(ManagerError::AlreadyConfigured);
        }
        self.loader = Some(Box::new(loader));
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.loader.is_some()
    }

    pub fn loader(&self) -> ManagerResult<&dyn PersistenceLoader> {
        self.loader.as_deref().ok_or(ManagerError::Unconfigured)
    }

    pub fn current_model(&self) -> Option<&RelationalModel> {
        self.current.as_ref()
    }

    /// Make `model` the active model and notify listeners. Returns the
    /// previously active model.
    pub fn set_current_model(&mut self, model: RelationalModel) -> Option<RelationalModel> {
        let old = self.current.take();
        let new = &*self.current.insert(model);
        debug!(
            model = new.name(),
            listeners = self.listeners.len(),
            "active model replaced"
        );
        notify(
            &mut self.listeners,
            &ModelEvent::Replaced {
                old: old.as_ref(),
                new,
            },
        );
        old
    }

    /// Apply an edit to the active model. This is the only way to change the
    /// active model in place, so every change reaches the listeners.
    ///
    /// The edit runs against a copy that only replaces the active model if the
    /// whole edit succeeds, so a failing edit leaves the model unchanged and
    /// notifies nobody.
    pub fn edit_current_model<T>(
        &mut self,
        edit: impl FnOnce(&mut RelationalModel) -> ModelResult<T>,
    ) -> ManagerResult<T> {
        let current = self.current.as_mut().ok_or(ManagerError::NoActiveModel)?;
        let mut draft = current.clone();
        let value = edit(&mut draft)?;
        *current = draft;
        notify(&mut self.listeners, &ModelEvent::Edited { model: current });
        Ok(value)
    }

    /// Save the active model under its own name.
    pub fn save(&self) -> ManagerResult<()> {
        let loader = self.loader()?;
        let model = self.current.as_ref().ok_or(ManagerError::NoActiveModel)?;
        loader.save_model(model)?;
        Ok(())
    }

    /// Save the active model under `name`. The active model takes the new name
    /// only once the save has succeeded.
    pub fn save_as(&mut self, name: &str) -> ManagerResult<()> {
        validate_model_name(name)?;
        let loader = self.loader.as_deref().ok_or(ManagerError::Unconfigured)?;
        let current = self.current.as_mut().ok_or(ManagerError::NoActiveModel)?;
        let mut renamed = current.clone();
        renamed.rename(name);
        loader.save_model(&renamed)?;
        current.rename(name);
        info!(model = name, "active model saved under new name");
        Ok(())
    }

    /// Load `name` and make it the active model. On failure the previously
    /// active model stays active. Returns the model that was replaced.
    pub fn load(&mut self, name: &str) -> ManagerResult<Option<RelationalModel>> {
        let model = self.loader()?.load_model(name)?;
        info!(model = name, "loaded model");
        Ok(self.set_current_model(model))
    }

    pub fn model_list(&self) -> ManagerResult<Vec<String>> {
        Ok(self.loader()?.model_list()?)
    }

    pub fn model_exists(&self, name: &str) -> ManagerResult<bool> {
        Ok(self.model_list()?.iter().any(|stored| stored == name))
    }

    pub fn delete_model(&self, name: &str) -> ManagerResult<bool> {
        Ok(self.loader()?.delete_model(name)?)
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn add_listener(&mut self, listener: impl FnMut(&ModelEvent<'_>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

fn notify(listeners: &mut [(ListenerId, Listener)], event: &ModelEvent<'_>) {
    for (_, listener) in listeners.iter_mut() {
        listener(event);
    }
}
