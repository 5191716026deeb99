//! NHL odds snapshots from The Odds API, written as fixed-column CSV files.
//!
//! - [`extract`]: per-bookmaker flattening of h2h, spreads and totals
//! - [`timestamp`]: snapshot time inference from file names
//! - [`backfill`]: in-place timestamp column backfill for existing CSVs
//! - [`live`] and [`historical`]: the two fetch runners
//! - [`client`], [`config`], [`odds`], [`row`]: API access, settings, wire types and output rows

pub mod backfill;
pub mod client;
pub mod config;
pub mod extract;
pub mod historical;
pub mod live;
pub mod odds;
pub mod row;
pub mod timestamp;

pub use extract::{extract, MarketLines};
pub use timestamp::{infer, infer_for_path, UtcHour};
