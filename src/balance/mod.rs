//! The balance ledger: one current-balance entry per funding source.

mod adjust_endpoint;
mod core;
mod list_endpoint;

pub use adjust_endpoint::adjust_balance_endpoint;
pub use core::{
    BalanceEntry, apply_delta, create_balance_table, get_balance, list_balances, set_absolute,
};
pub use list_endpoint::list_balances_endpoint;
