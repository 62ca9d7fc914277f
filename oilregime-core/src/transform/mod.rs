//! Pure tier transforms: bronze → silver alignment, silver → gold features,
//! gold → long-format rows for the sink.

pub mod align;
pub mod features;
pub mod long;

pub use align::{align, parse_date, week_ending, AlignError, Aligned, InvalidDatePolicy};
pub use features::{derive, diff, pct_change, rolling_std, FeatureError, VOL_WINDOW};
pub use long::to_long;
