//! Daily cash-history snapshots derived from the transaction log.

mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{
    DailyHistoryRecord, compute_snapshot, create_history_table, list_history,
};
pub use create_endpoint::create_snapshot_endpoint;
pub use list_endpoint::list_history_endpoint;
