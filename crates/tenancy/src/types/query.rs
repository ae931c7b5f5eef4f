//! Read queries.
//!
//! A [`Query`] names an entity type plus predicates, ordering and a limit.
//! Callers build the explicit part; the data layer appends the default read
//! filters installed for the type when it compiles the query.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single row condition. Conditions in a query are combined with AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// `column = value`
    Eq {
        /// Constrained column.
        column: String,
        /// Required value.
        value: Value,
    },

    /// `column IN (values...)`; an empty list matches nothing.
    In {
        /// Constrained column.
        column: String,
        /// Accepted values.
        values: Vec<Value>,
    },

    /// `column IS NULL`
    IsNull {
        /// Constrained column.
        column: String,
    },
}

impl Predicate {
    /// Creates an equality predicate.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Returns the column this predicate constrains.
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. }
            | Predicate::In { column, .. }
            | Predicate::IsNull { column } => column,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// The column to sort by.
    pub column: String,
    /// The direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Parses `"name"` (ascending) or `"-name"` (descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(column) => Self {
                column: column.to_string(),
                direction: SortDirection::Desc,
            },
            None => Self {
                column: s.to_string(),
                direction: SortDirection::Asc,
            },
        }
    }
}

/// A read against one entity type.
///
/// Without an explicit ordering, results come back by primary key, which is
/// creation order.
///
/// # Examples
///
/// ```
/// use helios_tenancy::types::{Query, SortDirective};
///
/// let query = Query::new("Book")
///     .filter("name", "ledger")
///     .with_sort(SortDirective::parse("-id"))
///     .with_limit(10);
///
/// assert_eq!(query.entity_type(), "Book");
/// assert_eq!(query.predicates().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    entity_type: String,
    predicates: Vec<Predicate>,
    sort: Vec<SortDirective>,
    limit: Option<usize>,
}

impl Query {
    /// Creates a query returning every visible row of `entity_type`.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            predicates: Vec::new(),
            sort: Vec::new(),
            limit: None,
        }
    }

    /// Adds `column = value`.
    pub fn filter(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_predicate(Predicate::eq(column, value))
    }

    /// Adds an arbitrary predicate.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds an ordering clause.
    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort.push(sort);
        self
    }

    /// Limits the number of rows returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the explicit predicates.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns the ordering clauses.
    pub fn sort(&self) -> &[SortDirective] {
        &self.sort
    }

    /// Returns the limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
