//! Error types for tenant scoping.
//!
//! This module defines all error types used by the tenancy layer, separating
//! registration-time configuration errors from data-layer storage errors.
//! Errors raised by a body passed to `with_tenant` are never wrapped here; they
//! flow back to the caller untouched.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::Dimension;

/// Umbrella error for callers that mix registration and storage calls.
#[derive(Error, Debug)]
pub enum TenancyError {
    /// Registration-time configuration errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Data-layer errors
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised synchronously while registering tenant-scoped types or
/// writing the tenant context.
///
/// These are never produced at query or insert time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Registration options were not given as a map.
    #[error("options for register_scoped must be a map, got {found}")]
    InvalidOptions { found: String },

    /// An option key outside the supported set was given.
    #[error("unknown option for register_scoped: {key:?} => {value}")]
    UnknownOption { key: String, value: String },

    /// An explicit dimension key is not a valid identifier.
    #[error("invalid dimension key {key:?}: {reason}")]
    InvalidDimensionKey { key: String, reason: String },

    /// The type was already registered under a different dimension.
    #[error(
        "conflicting registration for {entity_type}: already scoped on dimension {existing}, requested {requested}"
    )]
    ConflictingDimension {
        entity_type: String,
        existing: Dimension,
        requested: Dimension,
    },

    /// The named association is not declared on the entity type.
    #[error("association {association:?} not declared on {entity_type}")]
    AssociationNotFound {
        entity_type: String,
        association: String,
    },

    /// The entity type is unknown to the data-mapping layer.
    #[error("unknown model: {entity_type}")]
    UnknownModel { entity_type: String },

    /// Context access for a type that was never registered as tenant-scoped.
    #[error("{entity_type} is not registered as tenant-scoped")]
    NotTenantScoped { entity_type: String },

    /// A tenant was written from a runtime worker with no task scope, where
    /// the slot would be shared by every task the worker polls.
    #[error(
        "cannot write the {dimension} tenant outside a task scope on an async runtime; use with_tenant_async, TenantContext::scope or TenantContext::spawn"
    )]
    UnscopedTask { dimension: Dimension },
}

/// The primary error type for data-layer operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Model configuration errors surfaced through the data layer
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested record was not found (or is hidden by a tenant filter).
    #[error("record not found: {entity_type}/{id}")]
    NotFound { entity_type: String, id: i64 },

    /// An update was attempted on a record that was never persisted.
    #[error("record of type {entity_type} has not been persisted")]
    NotPersisted { entity_type: String },

    /// A create was attempted on a record that already has a primary key.
    #[error("record already persisted: {entity_type}/{id}")]
    AlreadyPersisted { entity_type: String, id: i64 },
}

/// Errors related to record validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The record carries an attribute that is not a declared column.
    #[error("unknown attribute {attribute} for {entity_type}")]
    UnknownAttribute {
        entity_type: String,
        attribute: String,
    },

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// An attribute value cannot be stored in the declared column type.
    #[error("invalid value for {entity_type}.{attribute}: {message}")]
    InvalidValue {
        entity_type: String,
        attribute: String,
        message: String,
    },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for registration operations.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}
