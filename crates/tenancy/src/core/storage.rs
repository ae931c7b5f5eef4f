//! Core record storage trait.
//!
//! This module defines the [`RecordStorage`] trait, the CRUD surface of the
//! data layer. Backends apply the default read filters and pre-persist hooks
//! installed through [`HookRegistry`](super::HookRegistry) inside these calls,
//! so callers never pass tenant information explicitly.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{Query, Record};

/// Core storage trait for modelled records.
///
/// # Tenant Isolation
///
/// Implementations must compile the installed default read filters into
/// every `find`, `all` and `count`, and run create-phase pre-persist hooks
/// before every `create`. There is no unfiltered read.
///
/// # Example
///
/// ```ignore
/// use helios_tenancy::core::RecordStorage;
/// use helios_tenancy::types::{Query, Record};
///
/// async fn example<S: RecordStorage>(storage: &S) -> StorageResult<()> {
///     let user = storage.create(Record::new("User").with("name", "alice")).await?;
///     let found = storage.find("User", user.id().unwrap()).await?;
///     assert!(found.is_some());
///
///     let all = storage.all(&Query::new("User")).await?;
///     println!("{} visible users", all.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Inserts a new record and returns it with its primary key assigned.
    ///
    /// # Errors
    ///
    /// * `ResourceError::AlreadyPersisted` - if the record already has an id
    /// * `ValidationError::UnknownAttribute` - if an attribute is not a declared column
    /// * `ValidationError::MissingRequiredField` - if a required column is unset
    async fn create(&self, record: Record) -> StorageResult<Record>;

    /// Writes the attributes of a persisted record.
    ///
    /// Create-phase hooks do not run, so an existing foreign key is never
    /// changed behind the caller's back.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotPersisted` - if the record has no id
    /// * `ResourceError::NotFound` - if no row with that id exists
    async fn update(&self, record: Record) -> StorageResult<Record>;

    /// Reads one record by primary key, subject to the read filters.
    ///
    /// Returns `Ok(None)` when the row does not exist or is filtered out.
    async fn find(&self, entity_type: &str, id: i64) -> StorageResult<Option<Record>>;

    /// Returns every visible record matching `query`.
    async fn all(&self, query: &Query) -> StorageResult<Vec<Record>>;

    /// Counts the visible records matching `query`.
    async fn count(&self, query: &Query) -> StorageResult<u64>;

    /// Returns the first visible record matching `query`.
    async fn first(&self, query: &Query) -> StorageResult<Option<Record>> {
        let limited = query.clone().with_limit(1);
        Ok(self.all(&limited).await?.into_iter().next())
    }
}
