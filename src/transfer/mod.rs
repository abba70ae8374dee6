//! The transfer workflow: moving money between two funding sources.

mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{
    TransferOutcome, TransferRecord, TransferRequest, TransferWithLegs, create_transfer_table,
    execute_transfer, list_transfers,
};
pub use create_endpoint::create_transfer_endpoint;
pub use list_endpoint::list_transfers_endpoint;
