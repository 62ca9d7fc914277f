//! Columnar record batch shared by every tier and both codecs.

use super::schema::SchemaError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit column appended by the writer to every snapshot.
pub const AUDIT_COLUMN: &str = "ingested_at";

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Utf8,
    Date,
    /// Nullable; null marks an undefined value.
    Float64,
    /// UTC instant, microsecond precision.
    Timestamp,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Utf8 => "utf8",
            DataType::Date => "date",
            DataType::Float64 => "float64",
            DataType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub dtype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Utf8(Vec<String>),
    Date(Vec<NaiveDate>),
    Float64(Vec<Option<f64>>),
    Timestamp(Vec<DateTime<Utc>>),
}

impl ColumnData {
    pub fn dtype(&self) -> DataType {
        match self {
            ColumnData::Utf8(_) => DataType::Utf8,
            ColumnData::Date(_) => DataType::Date,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::Timestamp(_) => DataType::Timestamp,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Utf8(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical text form of one cell. Used by the CSV codec and the
    /// fingerprint, so both agree on what "the same value" means.
    pub fn cell_text(&self, row: usize) -> String {
        match self {
            ColumnData::Utf8(v) => v[row].clone(),
            ColumnData::Date(v) => v[row].format("%Y-%m-%d").to_string(),
            ColumnData::Float64(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnData::Timestamp(v) => {
                v[row].to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.data.dtype())
    }
}

/// A rectangular set of named, typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    columns: Vec<Column>,
    height: usize,
}

impl Batch {
    /// Build a batch, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let height = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.data.len() != height {
                return Err(SchemaError::LengthMismatch {
                    column: col.name.clone(),
                    expected: height,
                    actual: col.data.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(SchemaError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns, height })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn schema(&self) -> Vec<Field> {
        self.columns.iter().map(Column::field).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    pub fn utf8(&self, name: &str) -> Result<&[String], SchemaError> {
        match &self.column(name)?.data {
            ColumnData::Utf8(v) => Ok(v),
            other => Err(SchemaError::type_mismatch(name, DataType::Utf8, other.dtype())),
        }
    }

    pub fn date(&self, name: &str) -> Result<&[NaiveDate], SchemaError> {
        match &self.column(name)?.data {
            ColumnData::Date(v) => Ok(v),
            other => Err(SchemaError::type_mismatch(name, DataType::Date, other.dtype())),
        }
    }

    pub fn float64(&self, name: &str) -> Result<&[Option<f64>], SchemaError> {
        match &self.column(name)?.data {
            ColumnData::Float64(v) => Ok(v),
            other => Err(SchemaError::type_mismatch(name, DataType::Float64, other.dtype())),
        }
    }

    pub fn timestamp(&self, name: &str) -> Result<&[DateTime<Utc>], SchemaError> {
        match &self.column(name)?.data {
            ColumnData::Timestamp(v) => Ok(v),
            other => Err(SchemaError::type_mismatch(name, DataType::Timestamp, other.dtype())),
        }
    }

    /// Append the audit column, every row stamped with the same instant.
    pub fn with_audit(mut self, at: DateTime<Utc>) -> Result<Self, SchemaError> {
        if self.columns.iter().any(|c| c.name == AUDIT_COLUMN) {
            return Err(SchemaError::DuplicateColumn(AUDIT_COLUMN.to_string()));
        }
        self.columns.push(Column::new(
            AUDIT_COLUMN,
            ColumnData::Timestamp(vec![at; self.height]),
        ));
        Ok(self)
    }

    /// Split off the audit column, if present.
    pub fn split_audit(mut self) -> Result<(Self, Option<Vec<DateTime<Utc>>>), SchemaError> {
        let Some(idx) = self.columns.iter().position(|c| c.name == AUDIT_COLUMN) else {
            return Ok((self, None));
        };
        let col = self.columns.remove(idx);
        match col.data {
            ColumnData::Timestamp(stamps) => Ok((self, Some(stamps))),
            other => Err(SchemaError::type_mismatch(
                AUDIT_COLUMN,
                DataType::Timestamp,
                other.dtype(),
            )),
        }
    }

    /// BLAKE3 over column names, types and cell text of the business columns.
    ///
    /// The audit column is excluded: two writes of the same rows at different
    /// times share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for col in self.columns.iter().filter(|c| c.name != AUDIT_COLUMN) {
            hasher.update(col.name.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(col.data.dtype().to_string().as_bytes());
            hasher.update(b"\x1e");
            for row in 0..self.height {
                hasher.update(col.data.cell_text(row).as_bytes());
                hasher.update(b"\x1f");
            }
            hasher.update(b"\x1d");
        }
        hasher.finalize().to_hex().to_string()
    }
}
