//! Snapshot encodings.
//!
//! Columnar (Parquet) is preferred. When the build has no Parquet
//! support, or encoding fails, the identical rows are written as CSV
//! and the caller is told which format was actually used.

pub mod delimited;
#[cfg(feature = "parquet")]
pub mod columnar;

use crate::domain::SnapshotFormat;
use crate::table::{Batch, Field, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{format} codec is not available in this build")]
    Unavailable { format: SnapshotFormat },

    #[error("{format} encode failed: {reason}")]
    Encode {
        format: SnapshotFormat,
        reason: String,
    },

    #[error("{format} decode failed: {reason}")]
    Decode {
        format: SnapshotFormat,
        reason: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Bytes ready to be stored, tagged with the format that produced them.
#[derive(Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub format: SnapshotFormat,
    /// Why the preferred format was not used, when it was not.
    pub degraded: Option<CodecError>,
}

/// Whether this build can write and read columnar snapshots.
pub fn parquet_available() -> bool {
    cfg!(feature = "parquet")
}

/// Columnar encoder used by `encode_preferred_with`.
pub type ColumnarEncoder = fn(&Batch) -> Result<Vec<u8>, CodecError>;

/// The build's Parquet encoder, if it has one.
pub fn columnar_encoder() -> Option<ColumnarEncoder> {
    if parquet_available() {
        Some(encode_parquet as ColumnarEncoder)
    } else {
        None
    }
}

/// Encode a batch in exactly one format.
pub fn encode(batch: &Batch, format: SnapshotFormat) -> Result<Vec<u8>, CodecError> {
    match format {
        SnapshotFormat::Csv => delimited::encode(batch),
        SnapshotFormat::Parquet => encode_parquet(batch),
    }
}

/// Encode with the build's preferred format, falling back to CSV.
pub fn encode_preferred(batch: &Batch) -> Result<Encoded, CodecError> {
    encode_preferred_with(batch, columnar_encoder())
}

/// Encode with `columnar` when given, falling back to CSV.
///
/// Only a CSV failure is an error; a columnar failure or a missing columnar
/// encoder is reported through `Encoded::degraded`.
pub fn encode_preferred_with(
    batch: &Batch,
    columnar: Option<ColumnarEncoder>,
) -> Result<Encoded, CodecError> {
    let degraded = match columnar {
        Some(encode_columnar) => match encode_columnar(batch) {
            Ok(bytes) => {
                return Ok(Encoded {
                    bytes,
                    format: SnapshotFormat::Parquet,
                    degraded: None,
                })
            }
            Err(e) => e,
        },
        None => CodecError::Unavailable {
            format: SnapshotFormat::Parquet,
        },
    };

    let bytes = delimited::encode(batch)?;
    Ok(Encoded {
        bytes,
        format: SnapshotFormat::Csv,
        degraded: Some(degraded),
    })
}

/// Decode snapshot bytes.
///
/// CSV carries no types, so `schema` maps the header names to typed fields.
/// Parquet carries its own types; the caller validates them afterwards.
pub fn decode<F>(format: SnapshotFormat, bytes: &[u8], schema: F) -> Result<Batch, CodecError>
where
    F: Fn(&[String]) -> Result<Vec<Field>, SchemaError>,
{
    match format {
        SnapshotFormat::Csv => delimited::decode(bytes, schema),
        SnapshotFormat::Parquet => decode_parquet(bytes),
    }
}

#[cfg(feature = "parquet")]
fn encode_parquet(batch: &Batch) -> Result<Vec<u8>, CodecError> {
    columnar::encode(batch)
}

#[cfg(not(feature = "parquet"))]
fn encode_parquet(_batch: &Batch) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::Unavailable {
        format: SnapshotFormat::Parquet,
    })
}

#[cfg(feature = "parquet")]
fn decode_parquet(bytes: &[u8]) -> Result<Batch, CodecError> {
    columnar::decode(bytes)
}

#[cfg(not(feature = "parquet"))]
fn decode_parquet(_bytes: &[u8]) -> Result<Batch, CodecError> {
    Err(CodecError::Unavailable {
        format: SnapshotFormat::Parquet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnData, DataType};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn batch() -> Batch {
        Batch::new(vec![
            Column::new(
                "date",
                ColumnData::Date(vec![
                    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
                ]),
            ),
            Column::new("series_id", ColumnData::Utf8(vec!["A,B".into(), "say \"hi\"".into()])),
            Column::new("value", ColumnData::Float64(vec![Some(0.1), None])),
            Column::new(
                "ingested_at",
                ColumnData::Timestamp(vec![Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(); 2]),
            ),
        ])
        .unwrap()
    }

    fn schema(names: &[String]) -> Result<Vec<Field>, SchemaError> {
        Ok(names
            .iter()
            .map(|n| {
                let dtype = match n.as_str() {
                    "date" => DataType::Date,
                    "value" => DataType::Float64,
                    "ingested_at" => DataType::Timestamp,
                    _ => DataType::Utf8,
                };
                Field::new(n.clone(), dtype)
            })
            .collect())
    }

    #[test]
    fn preferred_format_matches_build() {
        let encoded = encode_preferred(&batch()).unwrap();
        if parquet_available() {
            assert_eq!(encoded.format, SnapshotFormat::Parquet);
            assert!(encoded.degraded.is_none());
        } else {
            assert_eq!(encoded.format, SnapshotFormat::Csv);
            assert!(matches!(encoded.degraded, Some(CodecError::Unavailable { .. })));
        }
        let back = decode(encoded.format, &encoded.bytes, schema).unwrap();
        assert_eq!(back, batch());
    }

    fn failing_parquet(_: &Batch) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Encode {
            format: SnapshotFormat::Parquet,
            reason: "disk quota".into(),
        })
    }

    #[test]
    fn failed_columnar_encoding_falls_back_to_csv() {
        let encoded =
            encode_preferred_with(&batch(), Some(failing_parquet as ColumnarEncoder)).unwrap();
        assert_eq!(encoded.format, SnapshotFormat::Csv);
        assert!(matches!(encoded.degraded, Some(CodecError::Encode { .. })));
        let back = decode(SnapshotFormat::Csv, &encoded.bytes, schema).unwrap();
        assert_eq!(back, batch());
    }

    #[test]
    fn no_columnar_encoder_writes_csv() {
        let encoded = encode_preferred_with(&batch(), None).unwrap();
        assert_eq!(encoded.format, SnapshotFormat::Csv);
        assert!(matches!(encoded.degraded, Some(CodecError::Unavailable { .. })));
    }

    #[test]
    fn csv_roundtrip_keeps_nulls_and_quoting() {
        let bytes = encode(&batch(), SnapshotFormat::Csv).unwrap();
        let back = decode(SnapshotFormat::Csv, &bytes, schema).unwrap();
        assert_eq!(back, batch());
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn parquet_roundtrip() {
        let bytes = encode(&batch(), SnapshotFormat::Parquet).unwrap();
        let back = decode(SnapshotFormat::Parquet, &bytes, schema).unwrap();
        assert_eq!(back, batch());
    }
}
