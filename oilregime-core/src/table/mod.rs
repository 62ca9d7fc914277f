//! Record batches, declared tier schemas, and schema validation.

pub mod batch;
pub mod schema;
pub mod tables;

pub use batch::{Batch, Column, ColumnData, DataType, Field, AUDIT_COLUMN};
pub use schema::{stored_schema, validate, SchemaError, Table};
pub use tables::{AlignedTable, BronzeTable, FeatureTable};
