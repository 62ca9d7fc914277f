//! Parquet snapshots through polars.

use super::CodecError;
use crate::domain::SnapshotFormat;
use crate::table::{Batch, Column, ColumnData};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use polars::prelude as pl;
use polars::prelude::SerReader;
use std::io::Cursor;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

fn encode_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::Encode {
        format: SnapshotFormat::Parquet,
        reason: e.to_string(),
    }
}

fn decode_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::Decode {
        format: SnapshotFormat::Parquet,
        reason: e.to_string(),
    }
}

pub fn encode(batch: &Batch) -> Result<Vec<u8>, CodecError> {
    let columns = batch
        .columns()
        .iter()
        .map(to_polars)
        .collect::<Result<Vec<_>, _>>()
        .map_err(encode_err)?;
    let mut df = pl::DataFrame::new(columns).map_err(encode_err)?;

    let mut buf = Vec::new();
    pl::ParquetWriter::new(&mut buf)
        .finish(&mut df)
        .map_err(encode_err)?;
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Batch, CodecError> {
    let df = pl::ParquetReader::new(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(decode_err)?;

    let columns = df
        .get_columns()
        .iter()
        .map(from_polars)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Batch::new(columns)?)
}

fn to_polars(col: &Column) -> pl::PolarsResult<pl::Column> {
    let name: pl::PlSmallStr = col.name.as_str().into();
    let out = match &col.data {
        ColumnData::Utf8(v) => pl::Column::new(name, v.as_slice()),
        ColumnData::Float64(v) => pl::Column::new(name, v.as_slice()),
        ColumnData::Date(v) => {
            let days: Vec<i32> = v
                .iter()
                .map(|d| d.num_days_from_ce() - UNIX_EPOCH_CE_DAYS)
                .collect();
            pl::Column::new(name, days).cast(&pl::DataType::Date)?
        }
        ColumnData::Timestamp(v) => {
            let micros: Vec<i64> = v.iter().map(|t| t.timestamp_micros()).collect();
            pl::Column::new(name, micros)
                .cast(&pl::DataType::Datetime(pl::TimeUnit::Microseconds, None))?
        }
    };
    Ok(out)
}

fn from_polars(col: &pl::Column) -> Result<Column, CodecError> {
    let name = col.name().to_string();
    let n = col.len();
    let null_at = |row: usize| decode_err(format!("null in non-nullable column {name} at row {row}"));

    let data = match col.dtype() {
        pl::DataType::String => {
            let ca = col.str().map_err(decode_err)?;
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                out.push(ca.get(i).ok_or_else(|| null_at(i))?.to_string());
            }
            ColumnData::Utf8(out)
        }
        pl::DataType::Float64 => {
            let ca = col.f64().map_err(decode_err)?;
            ColumnData::Float64((0..n).map(|i| ca.get(i)).collect())
        }
        pl::DataType::Date => {
            let ca = col.date().map_err(decode_err)?;
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                let days = ca.get(i).ok_or_else(|| null_at(i))?;
                let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_CE_DAYS)
                    .ok_or_else(|| decode_err(format!("date out of range: {days}")))?;
                out.push(date);
            }
            ColumnData::Date(out)
        }
        pl::DataType::Datetime(_, _) => {
            let cast = col
                .cast(&pl::DataType::Datetime(pl::TimeUnit::Microseconds, None))
                .map_err(decode_err)?;
            let ca = cast.datetime().map_err(decode_err)?;
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                let micros = ca.get(i).ok_or_else(|| null_at(i))?;
                let at = DateTime::<Utc>::from_timestamp(
                    micros.div_euclid(1_000_000),
                    (micros.rem_euclid(1_000_000) * 1_000) as u32,
                )
                .ok_or_else(|| decode_err(format!("timestamp out of range: {micros}")))?;
                out.push(at);
            }
            ColumnData::Timestamp(out)
        }
        other => return Err(decode_err(format!("unsupported column type {other} in {name}"))),
    };
    Ok(Column::new(name, data))
}
