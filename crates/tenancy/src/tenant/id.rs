//! Tenant identifier type.
//!
//! This module defines the [`TenantId`] type, the identity of the record that
//! owns a dimension (a company, a bookkeeper, ...). It is the value written into
//! foreign-key columns and compared against them by the read filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The identity of a tenant record.
///
/// A `TenantId` wraps the primary key of the owning record. It can be built
/// from a raw key, or taken from a persisted [`Record`](crate::types::Record)
/// via [`Record::tenant_id`](crate::types::Record::tenant_id).
///
/// # Examples
///
/// ```
/// use helios_tenancy::tenant::TenantId;
///
/// let tenant = TenantId::new(42);
/// assert_eq!(tenant.value(), 42);
/// assert_eq!(tenant.to_string(), "42");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    /// Creates a tenant ID from a primary-key value.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw primary-key value.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TenantId)
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        TenantId(id)
    }
}

impl From<TenantId> for i64 {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl From<TenantId> for serde_json::Value {
    fn from(id: TenantId) -> Self {
        serde_json::Value::from(id.0)
    }
}
