//! Core types for records and queries.

mod query;
mod record;

pub use query::{Predicate, Query, SortDirection, SortDirective};
pub use record::Record;
