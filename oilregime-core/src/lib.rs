//! OilRegime Core: tiered snapshot storage and the weekly feature chain.
//!
//! - Domain types (tiers, table locations, snapshot ids, tier records)
//! - Typed record batches with explicit per-tier schemas
//! - Columnar (parquet) and delimited (CSV) snapshot codecs
//! - Append-only snapshot storage: filesystem and in-memory
//! - Tiered writer and latest-version resolver
//! - Weekly alignment, feature derivation, long-format reshape
//! - Source adapter trait and the EIA series client

pub mod codec;
pub mod domain;
pub mod snapshot;
pub mod source;
pub mod storage;
pub mod table;
pub mod transform;
