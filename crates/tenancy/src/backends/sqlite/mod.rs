//! SQLite backend implementation.
//!
//! This module provides the reference data-mapping layer: a table per
//! modelled entity type, `belongs_to` foreign keys as integer columns, and
//! default read filters compiled into every SELECT.
//!
//! # Example
//!
//! ```
//! use helios_tenancy::backends::sqlite::SqliteBackend;
//! use helios_tenancy::core::{ColumnType, ModelDefinition};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.define_model(ModelDefinition::new("Company").column("name", ColumnType::Text))?;
//! backend.define_model(
//!     ModelDefinition::new("User")
//!         .column("name", ColumnType::Text)
//!         .belongs_to("company", "Company"),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! Each model maps to one table:
//!
//! ```sql
//! CREATE TABLE users (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name TEXT,
//!     company_id INTEGER,
//!     created_at TEXT NOT NULL,  -- RFC 3339
//!     updated_at TEXT NOT NULL
//! );
//! CREATE INDEX idx_users_company_id ON users (company_id);
//! ```

mod backend;
pub mod schema;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
