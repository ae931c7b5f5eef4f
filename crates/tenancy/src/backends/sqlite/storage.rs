//! RecordStorage implementation for SQLite.
//!
//! Default read filters are evaluated while a query is compiled and appended
//! to its WHERE clause, so each statement sees the tenant context of the
//! caller at that moment.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Row, params_from_iter};
use serde_json::{Map, Value};

use crate::core::{ColumnType, ModelDefinition, PersistPhase, RecordStorage};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult, ValidationError};
use crate::types::{Predicate, Query, Record};

use super::SqliteBackend;
use super::schema::{CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN, quote_ident};

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

fn query_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::QueryError { message })
}

fn invalid_value(model: &ModelDefinition, attribute: &str, message: impl Into<String>) -> StorageError {
    StorageError::Validation(ValidationError::InvalidValue {
        entity_type: model.name().to_string(),
        attribute: attribute.to_string(),
        message: message.into(),
    })
}

/// Storage type of `column`, including the implicit ones.
fn column_type(model: &ModelDefinition, column: &str) -> Option<ColumnType> {
    match column {
        ID_COLUMN => Some(ColumnType::Integer),
        CREATED_AT_COLUMN | UPDATED_AT_COLUMN => Some(ColumnType::Text),
        _ => model.column_named(column).map(|c| c.column_type),
    }
}

fn require_column(model: &ModelDefinition, column: &str) -> StorageResult<ColumnType> {
    column_type(model, column).ok_or_else(|| {
        StorageError::Validation(ValidationError::UnknownAttribute {
            entity_type: model.name().to_string(),
            attribute: column.to_string(),
        })
    })
}

/// Converts an attribute value to the SQL value stored for `column`.
fn to_sql(model: &ModelDefinition, column: &str, value: &Value) -> StorageResult<SqlValue> {
    let column_type = require_column(model, column)?;
    if value.is_null() {
        return Ok(SqlValue::Null);
    }

    match column_type {
        ColumnType::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid_value(model, column, format!("expected an integer, got {}", value))),
        ColumnType::Real => value
            .as_f64()
            .map(SqlValue::Real)
            .ok_or_else(|| invalid_value(model, column, format!("expected a number, got {}", value))),
        ColumnType::Text => value
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .ok_or_else(|| invalid_value(model, column, format!("expected a string, got {}", value))),
        ColumnType::Boolean => value
            .as_bool()
            .map(|b| SqlValue::Integer(i64::from(b)))
            .ok_or_else(|| invalid_value(model, column, format!("expected a boolean, got {}", value))),
        ColumnType::Json => Ok(SqlValue::Text(value.to_string())),
    }
}

/// Converts a stored SQL value back to an attribute value.
fn from_sql(column: &str, column_type: ColumnType, value: ValueRef<'_>) -> StorageResult<Value> {
    match (column_type, value) {
        (_, ValueRef::Null) => Ok(Value::Null),
        (ColumnType::Boolean, ValueRef::Integer(i)) => Ok(Value::Bool(i != 0)),
        (_, ValueRef::Integer(i)) => Ok(Value::from(i)),
        (_, ValueRef::Real(f)) => Ok(Value::from(f)),
        (ColumnType::Json, ValueRef::Text(bytes)) => serde_json::from_slice(bytes).map_err(|e| {
            StorageError::Backend(BackendError::SerializationError {
                message: format!("Invalid JSON in column {}: {}", column, e),
            })
        }),
        (_, ValueRef::Text(bytes)) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| internal_error(format!("Invalid UTF-8 in column {}: {}", column, e))),
        (_, ValueRef::Blob(_)) => Err(internal_error(format!("Unexpected blob in column {}", column))),
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| internal_error(format!("Failed to parse timestamp {:?}: {}", value, e)))
}

/// Appends the SQL for `predicate` to `clauses`, pushing its parameters.
fn compile_predicate(
    model: &ModelDefinition,
    predicate: &Predicate,
    clauses: &mut Vec<String>,
    params: &mut Vec<SqlValue>,
) -> StorageResult<()> {
    let column = predicate.column();
    require_column(model, column)?;
    let quoted = quote_ident(column);

    match predicate {
        Predicate::Eq { value, .. } if value.is_null() => {
            clauses.push(format!("{} IS NULL", quoted));
        }
        Predicate::Eq { value, .. } => {
            params.push(to_sql(model, column, value)?);
            clauses.push(format!("{} = ?{}", quoted, params.len()));
        }
        Predicate::In { values, .. } if values.is_empty() => {
            clauses.push("0 = 1".to_string());
        }
        Predicate::In { values, .. } => {
            let mut placeholders = Vec::with_capacity(values.len());
            for value in values {
                params.push(to_sql(model, column, value)?);
                placeholders.push(format!("?{}", params.len()));
            }
            clauses.push(format!("{} IN ({})", quoted, placeholders.join(", ")));
        }
        Predicate::IsNull { .. } => {
            clauses.push(format!("{} IS NULL", quoted));
        }
    }
    Ok(())
}

/// A compiled statement and its parameters.
struct CompiledQuery {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqliteBackend {
    /// Builds the WHERE clause for `query` plus the read filters active now.
    fn compile_where(&self, model: &ModelDefinition, query: &Query) -> StorageResult<(String, Vec<SqlValue>)> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        for predicate in query.predicates() {
            compile_predicate(model, predicate, &mut clauses, &mut params)?;
        }
        for predicate in self.catalog().read_predicates(model.name()) {
            compile_predicate(model, &predicate, &mut clauses, &mut params)?;
        }

        if clauses.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
        }
    }

    fn compile_select(&self, model: &ModelDefinition, query: &Query) -> StorageResult<CompiledQuery> {
        let (where_clause, params) = self.compile_where(model, query)?;

        let mut columns = vec![quote_ident(ID_COLUMN)];
        columns.extend(model.columns().iter().map(|c| quote_ident(&c.name)));
        columns.push(quote_ident(CREATED_AT_COLUMN));
        columns.push(quote_ident(UPDATED_AT_COLUMN));

        let mut sql = format!(
            "SELECT {} FROM {}{}",
            columns.join(", "),
            quote_ident(model.table()),
            where_clause
        );

        let mut order = Vec::new();
        for directive in query.sort() {
            require_column(model, &directive.column)?;
            order.push(format!("{} {}", quote_ident(&directive.column), directive.direction));
        }
        if !query.sort().iter().any(|d| d.column == ID_COLUMN) {
            order.push(format!("{} ASC", quote_ident(ID_COLUMN)));
        }
        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));

        if let Some(limit) = query.limit() {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(CompiledQuery { sql, params })
    }

    fn compile_count(&self, model: &ModelDefinition, query: &Query) -> StorageResult<CompiledQuery> {
        let (where_clause, params) = self.compile_where(model, query)?;
        Ok(CompiledQuery {
            sql: format!("SELECT COUNT(*) FROM {}{}", quote_ident(model.table()), where_clause),
            params,
        })
    }

    /// Runs the create- or update-phase hooks and checks the record against
    /// its model.
    fn prepare_write(&self, record: &mut Record, phase: PersistPhase) -> StorageResult<Arc<ModelDefinition>> {
        let model = self.catalog().model(record.entity_type())?;
        self.catalog().run_pre_persist(record, phase);

        for attribute in record.attributes().keys() {
            if model.column_named(attribute).is_none() {
                return Err(StorageError::Validation(ValidationError::UnknownAttribute {
                    entity_type: model.name().to_string(),
                    attribute: attribute.clone(),
                }));
            }
        }
        for column in model.columns().iter().filter(|c| !c.nullable) {
            if !record.is_set(&column.name) {
                return Err(StorageError::Validation(ValidationError::MissingRequiredField {
                    field: column.name.clone(),
                }));
            }
        }
        Ok(model)
    }
}

/// Non-null attributes, as they will read back from storage.
fn stored_attributes(record: &Record) -> Map<String, Value> {
    record
        .attributes()
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn read_record(model: &ModelDefinition, row: &Row<'_>) -> StorageResult<Record> {
    let id: i64 = row.get(0)?;

    let mut attributes = Map::new();
    for (offset, column) in model.columns().iter().enumerate() {
        let value = from_sql(&column.name, column.column_type, row.get_ref(offset + 1)?)?;
        if !value.is_null() {
            attributes.insert(column.name.clone(), value);
        }
    }

    let base = model.columns().len() + 1;
    let created_at: String = row.get(base)?;
    let updated_at: String = row.get(base + 1)?;

    Ok(Record::from_storage(
        model.name(),
        id,
        attributes,
        Some(parse_timestamp(&created_at)?),
        Some(parse_timestamp(&updated_at)?),
    ))
}

#[async_trait]
impl RecordStorage for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(&self, record: Record) -> StorageResult<Record> {
        if let Some(id) = record.id() {
            return Err(StorageError::Resource(ResourceError::AlreadyPersisted {
                entity_type: record.entity_type().to_string(),
                id,
            }));
        }

        let mut record = record;
        let model = self.prepare_write(&mut record, PersistPhase::Create)?;

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for column in model.columns() {
            if let Some(value) = record.get(&column.name) {
                columns.push(quote_ident(&column.name));
                params.push(to_sql(&model, &column.name, value)?);
            }
        }

        let now = Utc::now();
        columns.push(quote_ident(CREATED_AT_COLUMN));
        columns.push(quote_ident(UPDATED_AT_COLUMN));
        params.push(SqlValue::Text(now.to_rfc3339()));
        params.push(SqlValue::Text(now.to_rfc3339()));

        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(model.table()),
            columns.join(", "),
            placeholders.join(", ")
        );

        let conn = self.get_connection()?;
        conn.execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| internal_error(format!("Failed to insert {}: {}", model.name(), e)))?;
        let id = conn.last_insert_rowid();

        tracing::debug!(entity_type = model.name(), id, "Created record");

        Ok(Record::from_storage(
            model.name(),
            id,
            stored_attributes(&record),
            Some(now),
            Some(now),
        ))
    }

    async fn update(&self, record: Record) -> StorageResult<Record> {
        let Some(id) = record.id() else {
            return Err(StorageError::Resource(ResourceError::NotPersisted {
                entity_type: record.entity_type().to_string(),
            }));
        };

        let mut record = record;
        let model = self.prepare_write(&mut record, PersistPhase::Update)?;

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for column in model.columns() {
            let value = record.get(&column.name).unwrap_or(&Value::Null);
            params.push(to_sql(&model, &column.name, value)?);
            assignments.push(format!("{} = ?{}", quote_ident(&column.name), params.len()));
        }

        let now = Utc::now();
        params.push(SqlValue::Text(now.to_rfc3339()));
        assignments.push(format!("{} = ?{}", quote_ident(UPDATED_AT_COLUMN), params.len()));
        params.push(SqlValue::Integer(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(model.table()),
            assignments.join(", "),
            quote_ident(ID_COLUMN),
            params.len()
        );

        let conn = self.get_connection()?;
        let changed = conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| internal_error(format!("Failed to update {}/{}: {}", model.name(), id, e)))?;

        if changed == 0 {
            return Err(StorageError::Resource(ResourceError::NotFound {
                entity_type: model.name().to_string(),
                id,
            }));
        }

        tracing::debug!(entity_type = model.name(), id, "Updated record");

        Ok(Record::from_storage(
            model.name(),
            id,
            stored_attributes(&record),
            record.created_at(),
            Some(now),
        ))
    }

    async fn find(&self, entity_type: &str, id: i64) -> StorageResult<Option<Record>> {
        let query = Query::new(entity_type).with_predicate(Predicate::eq(ID_COLUMN, id));
        self.first(&query).await
    }

    async fn all(&self, query: &Query) -> StorageResult<Vec<Record>> {
        let model = self.catalog().model(query.entity_type())?;
        let compiled = self.compile_select(&model, query)?;

        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&compiled.sql)
            .map_err(|e| query_error(format!("Failed to prepare query on {}: {}", model.name(), e)))?;
        let mut rows = stmt
            .query(params_from_iter(compiled.params.iter()))
            .map_err(|e| query_error(format!("Failed to query {}: {}", model.name(), e)))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(&model, row)?);
        }
        Ok(records)
    }

    async fn count(&self, query: &Query) -> StorageResult<u64> {
        let model = self.catalog().model(query.entity_type())?;
        let compiled = self.compile_count(&model, query)?;

        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row(&compiled.sql, params_from_iter(compiled.params.iter()), |row| row.get(0))
            .map_err(|e| query_error(format!("Failed to count {}: {}", model.name(), e)))?;
        Ok(count as u64)
    }
}
