//! Multitenancy tests against the SQLite backend.
//!
//! This module contains tests for tenant isolation, foreign-key
//! auto-population and multi-dimension composition.

pub mod composition_tests;
pub mod isolation_tests;
