//! SQLite table definitions derived from model definitions.

use rusqlite::Connection;

use crate::core::{ColumnType, ModelDefinition};
use crate::error::{BackendError, StorageError, StorageResult};

/// Primary key column, assigned by SQLite on insert.
pub const ID_COLUMN: &str = "id";
/// Insertion timestamp column (RFC 3339 text).
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Last-write timestamp column (RFC 3339 text).
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Quotes an identifier for use in SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        ColumnType::Real => "REAL",
        ColumnType::Text | ColumnType::Json => "TEXT",
    }
}

/// Returns the `CREATE TABLE` statement for `model`.
pub fn table_ddl(model: &ModelDefinition) -> String {
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_ident(ID_COLUMN))];
    for column in model.columns() {
        let mut definition = format!("{} {}", quote_ident(&column.name), sql_type(column.column_type));
        if !column.nullable {
            definition.push_str(" NOT NULL");
        }
        columns.push(definition);
    }
    columns.push(format!("{} TEXT NOT NULL", quote_ident(CREATED_AT_COLUMN)));
    columns.push(format!("{} TEXT NOT NULL", quote_ident(UPDATED_AT_COLUMN)));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(model.table()),
        columns.join(",\n    ")
    )
}

/// Returns one `CREATE INDEX` statement per association foreign key.
///
/// Scoped reads always filter on these columns.
pub fn index_ddl(model: &ModelDefinition) -> Vec<String> {
    model
        .associations()
        .iter()
        .map(|association| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_ident(&format!("idx_{}_{}", model.table(), association.foreign_key)),
                quote_ident(model.table()),
                quote_ident(&association.foreign_key)
            )
        })
        .collect()
}

/// Creates the table and indexes for `model` if they do not exist.
pub fn create_table(conn: &Connection, model: &ModelDefinition) -> StorageResult<()> {
    let mut statements = vec![table_ddl(model)];
    statements.extend(index_ddl(model));

    for sql in &statements {
        conn.execute(sql, []).map_err(|e| {
            StorageError::Backend(BackendError::Internal {
                backend_name: "sqlite".to_string(),
                message: format!("Failed to create table {}: {}", model.table(), e),
                source: None,
            })
        })?;
    }
    Ok(())
}
