//! CSV snapshots. Header row carries column names; types come from the
//! reader's declared schema.

use super::CodecError;
use crate::domain::SnapshotFormat;
use crate::table::{Batch, Column, ColumnData, DataType, Field, SchemaError};
use chrono::{DateTime, NaiveDate, Utc};

fn encode_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::Encode {
        format: SnapshotFormat::Csv,
        reason: e.to_string(),
    }
}

fn decode_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::Decode {
        format: SnapshotFormat::Csv,
        reason: e.to_string(),
    }
}

pub fn encode(batch: &Batch) -> Result<Vec<u8>, CodecError> {
    let mut wtr = ::csv::Writer::from_writer(vec![]);
    wtr.write_record(batch.column_names()).map_err(encode_err)?;
    for row in 0..batch.height() {
        wtr.write_record(batch.columns().iter().map(|c| c.data.cell_text(row)))
            .map_err(encode_err)?;
    }
    wtr.into_inner().map_err(encode_err)
}

pub fn decode<F>(bytes: &[u8], schema: F) -> Result<Batch, CodecError>
where
    F: Fn(&[String]) -> Result<Vec<Field>, SchemaError>,
{
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    let names: Vec<String> = rdr
        .headers()
        .map_err(decode_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let fields = schema(&names)?;
    if fields.len() != names.len() {
        return Err(decode_err(format!(
            "schema has {} fields for {} header columns",
            fields.len(),
            names.len()
        )));
    }

    let mut builders: Vec<ColumnData> = fields.iter().map(|f| empty(f.dtype)).collect();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(decode_err)?;
        for (col, (field, builder)) in fields.iter().zip(builders.iter_mut()).enumerate() {
            let cell = record.get(col).unwrap_or("");
            push_cell(builder, cell).map_err(|reason| SchemaError::InvalidValue {
                column: field.name.clone(),
                row,
                reason,
            })?;
        }
    }

    let columns = fields
        .into_iter()
        .zip(builders)
        .map(|(field, data)| Column::new(field.name, data))
        .collect();
    Ok(Batch::new(columns)?)
}

fn empty(dtype: DataType) -> ColumnData {
    match dtype {
        DataType::Utf8 => ColumnData::Utf8(Vec::new()),
        DataType::Date => ColumnData::Date(Vec::new()),
        DataType::Float64 => ColumnData::Float64(Vec::new()),
        DataType::Timestamp => ColumnData::Timestamp(Vec::new()),
    }
}

fn push_cell(builder: &mut ColumnData, cell: &str) -> Result<(), String> {
    match builder {
        ColumnData::Utf8(v) => v.push(cell.to_string()),
        ColumnData::Date(v) => v.push(
            NaiveDate::parse_from_str(cell, "%Y-%m-%d").map_err(|e| format!("{cell:?}: {e}"))?,
        ),
        ColumnData::Float64(v) => v.push(if cell.is_empty() {
            None
        } else {
            Some(cell.parse::<f64>().map_err(|e| format!("{cell:?}: {e}"))?)
        }),
        ColumnData::Timestamp(v) => v.push(
            DateTime::parse_from_rfc3339(cell)
                .map_err(|e| format!("{cell:?}: {e}"))?
                .with_timezone(&Utc),
        ),
    }
    Ok(())
}
