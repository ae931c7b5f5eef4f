//! Read filters and pre-persist hooks.
//!
//! The data layer exposes two extension points to the scoping layer:
//!
//! - a [`ReadFilter`] contributes a predicate to every read of an entity type,
//!   evaluated afresh each time a query is compiled;
//! - a [`PrePersistHook`] mutates a record before it is written.
//!
//! [`ModelCatalog`] is the in-memory bookkeeping a backend uses to implement
//! [`HookRegistry`] and [`ModelReflection`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::model::{AssociationReflection, ModelDefinition, ModelReflection};
use crate::error::{ConfigResult, ConfigurationError};
use crate::types::{Predicate, Record};

/// Contributes a predicate to reads of an entity type.
///
/// Returning `None` leaves the read unrestricted.
pub trait ReadFilter: Send + Sync {
    /// Returns the predicate for the read being compiled now.
    fn predicate(&self) -> Option<Predicate>;
}

impl<F> ReadFilter for F
where
    F: Fn() -> Option<Predicate> + Send + Sync,
{
    fn predicate(&self) -> Option<Predicate> {
        self()
    }
}

/// Mutates a record before it is persisted.
pub trait PrePersistHook: Send + Sync {
    /// Called with the record about to be written.
    fn before_persist(&self, record: &mut Record);
}

impl<F> PrePersistHook for F
where
    F: Fn(&mut Record) + Send + Sync,
{
    fn before_persist(&self, record: &mut Record) {
        self(record)
    }
}

/// Which writes a pre-persist hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistPhase {
    /// Inserts of new records only.
    Create,
    /// Updates of persisted records only.
    Update,
    /// Every write.
    Always,
}

impl PersistPhase {
    fn covers(self, phase: PersistPhase) -> bool {
        self == PersistPhase::Always || self == phase
    }
}

/// Installation of read filters and pre-persist hooks.
pub trait HookRegistry {
    /// Adds a default read filter for `entity_type`.
    ///
    /// Filters accumulate; every read applies all of them with AND.
    fn install_default_read_filter(&self, entity_type: &str, filter: Arc<dyn ReadFilter>) -> ConfigResult<()>;

    /// Adds a hook run before `entity_type` records are written in `phase`.
    fn install_pre_persist_hook(
        &self,
        entity_type: &str,
        hook: Arc<dyn PrePersistHook>,
        phase: PersistPhase,
    ) -> ConfigResult<()>;
}

/// A data-mapping layer the scoping layer can attach to.
pub trait DataMapper: ModelReflection + HookRegistry {}

impl<T: ModelReflection + HookRegistry + ?Sized> DataMapper for T {}

/// Registry of model definitions, read filters and pre-persist hooks.
#[derive(Default)]
pub struct ModelCatalog {
    models: RwLock<HashMap<String, Arc<ModelDefinition>>>,
    read_filters: RwLock<HashMap<String, Vec<Arc<dyn ReadFilter>>>>,
    hooks: RwLock<HashMap<String, Vec<(PersistPhase, Arc<dyn PrePersistHook>)>>>,
}

impl ModelCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a model definition.
    pub fn define(&self, model: ModelDefinition) -> Arc<ModelDefinition> {
        let model = Arc::new(model);
        self.models
            .write()
            .insert(model.name().to_string(), Arc::clone(&model));
        model
    }

    /// Returns the definition for `entity_type`.
    pub fn model(&self, entity_type: &str) -> ConfigResult<Arc<ModelDefinition>> {
        self.models
            .read()
            .get(entity_type)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownModel {
                entity_type: entity_type.to_string(),
            })
    }

    /// Returns every definition, sorted by name.
    pub fn models(&self) -> Vec<Arc<ModelDefinition>> {
        let mut all: Vec<_> = self.models.read().values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Evaluates the read filters of `entity_type` now.
    pub fn read_predicates(&self, entity_type: &str) -> Vec<Predicate> {
        // Clone the filter list so no lock is held while filters run.
        let filters = self
            .read_filters
            .read()
            .get(entity_type)
            .cloned()
            .unwrap_or_default();
        filters.iter().filter_map(|f| f.predicate()).collect()
    }

    /// Runs the hooks of `record`'s entity type registered for `phase`.
    pub fn run_pre_persist(&self, record: &mut Record, phase: PersistPhase) {
        let hooks = self
            .hooks
            .read()
            .get(record.entity_type())
            .cloned()
            .unwrap_or_default();
        for (registered, hook) in &hooks {
            if registered.covers(phase) {
                hook.before_persist(record);
            }
        }
    }

    fn require_model(&self, entity_type: &str) -> ConfigResult<()> {
        self.model(entity_type).map(|_| ())
    }
}

impl fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCatalog")
            .field("models", &self.models.read().len())
            .field("read_filters", &self.read_filters.read().len())
            .field("hooks", &self.hooks.read().len())
            .finish_non_exhaustive()
    }
}

impl ModelReflection for ModelCatalog {
    fn reflect_association(&self, entity_type: &str, name: &str) -> ConfigResult<AssociationReflection> {
        let model = self.model(entity_type)?;
        let association = model
            .association(name)
            .ok_or_else(|| ConfigurationError::AssociationNotFound {
                entity_type: entity_type.to_string(),
                association: name.to_string(),
            })?;

        Ok(AssociationReflection {
            entity_type: entity_type.to_string(),
            name: association.name.clone(),
            target_type: association.target_type.clone(),
            foreign_key: association.foreign_key.clone(),
        })
    }
}

impl HookRegistry for ModelCatalog {
    fn install_default_read_filter(&self, entity_type: &str, filter: Arc<dyn ReadFilter>) -> ConfigResult<()> {
        self.require_model(entity_type)?;
        self.read_filters
            .write()
            .entry(entity_type.to_string())
            .or_default()
            .push(filter);
        tracing::debug!(entity_type, "Installed default read filter");
        Ok(())
    }

    fn install_pre_persist_hook(
        &self,
        entity_type: &str,
        hook: Arc<dyn PrePersistHook>,
        phase: PersistPhase,
    ) -> ConfigResult<()> {
        self.require_model(entity_type)?;
        self.hooks
            .write()
            .entry(entity_type.to_string())
            .or_default()
            .push((phase, hook));
        tracing::debug!(entity_type, ?phase, "Installed pre-persist hook");
        Ok(())
    }
}
