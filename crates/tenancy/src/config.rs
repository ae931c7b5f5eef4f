//! Tenancy configuration.
//!
//! [`TenancyConfig`] carries the process-wide knobs for the scoping layer. It
//! deserializes from any serde format, with every field optional.
//!
//! # Example
//!
//! ```
//! use helios_tenancy::config::{NestedScope, TenancyConfig};
//!
//! let config: TenancyConfig = serde_json::from_str(r#"{"nested_scope": "clear"}"#).unwrap();
//! assert_eq!(config.nested_scope, NestedScope::Clear);
//! assert_eq!(config.default_association, "tenant");
//! ```

use serde::{Deserialize, Serialize};

/// What a `with_tenant` block leaves behind in its dimension's slot on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NestedScope {
    /// Put back whatever tenant was active before the block started.
    ///
    /// Nested blocks on the same dimension unwind like a stack, and a block
    /// entered with an empty slot leaves it empty.
    #[default]
    RestorePrevious,

    /// Always empty the slot on exit, discarding any outer tenant.
    Clear,
}

/// Configuration for [`Tenancy`](crate::Tenancy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Association name used by `belongs_to_tenant` when none is given.
    #[serde(default = "default_association")]
    pub default_association: String,

    /// Exit behavior of `with_tenant` blocks.
    #[serde(default)]
    pub nested_scope: NestedScope,
}

fn default_association() -> String {
    "tenant".to_string()
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            default_association: default_association(),
            nested_scope: NestedScope::default(),
        }
    }
}

impl TenancyConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nested-scope behavior.
    pub fn with_nested_scope(mut self, nested_scope: NestedScope) -> Self {
        self.nested_scope = nested_scope;
        self
    }

    /// Sets the default association name.
    pub fn with_default_association(mut self, association: impl Into<String>) -> Self {
        self.default_association = association.into();
        self
    }
}
