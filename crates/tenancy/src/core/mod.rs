//! Data-layer contract.
//!
//! The scoping layer never talks to a database directly. It relies on a data
//! layer that can:
//!
//! - describe `belongs_to` associations ([`ModelReflection`]);
//! - accept default read filters and pre-persist hooks ([`HookRegistry`]);
//! - store and load records ([`RecordStorage`]).
//!
//! [`DataMapper`] bundles the first two; any type implementing both can be
//! handed to the [`ScopeEnforcer`](crate::scope::ScopeEnforcer).

mod hooks;
mod model;
mod storage;

pub use hooks::{DataMapper, HookRegistry, ModelCatalog, PersistPhase, PrePersistHook, ReadFilter};
pub use model::{
    AssociationDefinition, AssociationReflection, ColumnDefinition, ColumnType, ModelDefinition,
    ModelReflection,
};
pub use storage::RecordStorage;
