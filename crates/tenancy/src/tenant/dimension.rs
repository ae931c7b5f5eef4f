//! Tenancy dimensions.
//!
//! A [`Dimension`] is the key into the per-execution-context tenant slots.
//! Every tenant-scoped entity type owns exactly one dimension, derived from
//! its name unless an explicit key is given at registration.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::ConfigurationError;

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("static regex"));

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"));

static DIMENSION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_/]*$").expect("static regex"));

/// Lower-snake-cases a type name: `BookKeeper` -> `book_keeper`,
/// `HTTPClient` -> `http_client`, `Billing::Account` -> `billing/account`.
pub(crate) fn underscore(name: &str) -> String {
    let name = name.replace("::", "/");
    let name = ACRONYM_BOUNDARY.replace_all(&name, "${1}_${2}");
    let name = WORD_BOUNDARY.replace_all(&name, "${1}_${2}");
    name.replace('-', "_").to_lowercase()
}

/// An independent axis of tenancy such as `company` or `bookkeeper`.
///
/// Dimensions are cheap to clone and compare; the key never changes once
/// created.
///
/// # Examples
///
/// ```
/// use helios_tenancy::tenant::Dimension;
///
/// assert_eq!(Dimension::derive("Company").as_str(), "company");
/// assert_eq!(Dimension::derive("BookKeeper").as_str(), "book_keeper");
/// assert_eq!(Dimension::derive("HTTPClient").as_str(), "http_client");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dimension(Arc<str>);

impl Dimension {
    /// Creates a dimension from a raw key without validation.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Creates a dimension from an explicit key supplied at registration.
    ///
    /// The key must start with a letter or underscore and may contain
    /// letters, digits, underscores and `/`.
    pub fn parse(key: &str) -> Result<Self, ConfigurationError> {
        if DIMENSION_KEY.is_match(key) {
            Ok(Self::new(key))
        } else {
            Err(ConfigurationError::InvalidDimensionKey {
                key: key.to_string(),
                reason: "expected an identifier made of letters, digits, '_' or '/'".to_string(),
            })
        }
    }

    /// Derives the default dimension for an entity type name by
    /// lower-snake-casing it. Namespace separators (`::`) become `/`.
    pub fn derive(entity_type: &str) -> Self {
        Self::new(underscore(entity_type))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimension({})", self.0)
    }
}

impl AsRef<str> for Dimension {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
