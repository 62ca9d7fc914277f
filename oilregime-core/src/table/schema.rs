//! Declared schemas for each tier and the SchemaMismatch condition.

use super::batch::{Batch, DataType, Field, AUDIT_COLUMN};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("unexpected column: {0}")]
    UnexpectedColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid value in column {column} at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },
}

impl SchemaError {
    pub fn type_mismatch(column: &str, expected: DataType, actual: DataType) -> Self {
        SchemaError::TypeMismatch {
            column: column.to_string(),
            expected,
            actual,
        }
    }
}

/// A tier table that can be stored in a snapshot.
///
/// Each implementation declares the schema it expects and validates incoming
/// batches against it, so a drifted upstream fails here with a clear
/// `SchemaError` instead of somewhere deep inside a transform.
pub trait Table: Sized {
    /// Typed schema for a stored table with the given business column names
    /// (audit column already removed). Fails if the names do not fit.
    fn read_schema(columns: &[String]) -> Result<Vec<Field>, SchemaError>;

    /// Columnar form, without the audit column.
    fn to_batch(&self) -> Batch;

    /// Rebuild from a batch, validating it against `read_schema` first.
    fn from_batch(batch: &Batch) -> Result<Self, SchemaError>;

    /// Number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Schema for a stored file: the table's own columns plus the audit column
/// wherever it appears.
pub fn stored_schema<T: Table>(columns: &[String]) -> Result<Vec<Field>, SchemaError> {
    let business: Vec<String> = columns
        .iter()
        .filter(|c| c.as_str() != AUDIT_COLUMN)
        .cloned()
        .collect();
    let typed = T::read_schema(&business)?;
    let mut typed = typed.into_iter();
    columns
        .iter()
        .map(|name| {
            if name == AUDIT_COLUMN {
                Ok(Field::new(AUDIT_COLUMN, DataType::Timestamp))
            } else {
                typed
                    .next()
                    .ok_or_else(|| SchemaError::UnexpectedColumn(name.clone()))
            }
        })
        .collect()
}

/// Check that `columns` are exactly `expected`, in order.
pub fn expect_columns(columns: &[String], expected: &[Field]) -> Result<Vec<Field>, SchemaError> {
    for field in expected {
        if !columns.iter().any(|c| *c == field.name) {
            return Err(SchemaError::MissingColumn(field.name.clone()));
        }
    }
    for name in columns {
        if !expected.iter().any(|f| f.name == *name) {
            return Err(SchemaError::UnexpectedColumn(name.clone()));
        }
    }
    // Same names, possibly reordered: answer in the caller's column order.
    Ok(columns
        .iter()
        .filter_map(|name| expected.iter().find(|f| f.name == *name).cloned())
        .collect())
}

/// Validate a batch against a declared schema: every column present with the
/// right type, nothing extra.
pub fn validate(batch: &Batch, expected: &[Field]) -> Result<(), SchemaError> {
    let names: Vec<String> = batch.column_names().iter().map(|s| s.to_string()).collect();
    expect_columns(&names, expected)?;
    for field in expected {
        let actual = batch.column(&field.name)?.data.dtype();
        if actual != field.dtype {
            return Err(SchemaError::type_mismatch(&field.name, field.dtype, actual));
        }
    }
    Ok(())
}
