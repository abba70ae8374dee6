//! The transaction log: append-mostly postings, each moving one account.

mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{
    DayTotals, NewTransaction, TransactionKind, TransactionRecord, count_transactions,
    create_transaction, create_transaction_table, day_totals, delete_transaction,
    get_transaction, list_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;

pub(crate) use core::map_transaction_row_at;

#[cfg(test)]
pub(crate) use core::test_posting;
