//! The store registry: the shops whose cash positions the ledger tracks.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    NewStore, Store, create_store, create_store_table, delete_store, get_store, list_stores,
    update_store,
};
pub use create_endpoint::create_store_endpoint;
pub use delete_endpoint::delete_store_endpoint;
pub use edit_endpoint::edit_store_endpoint;
pub use list_endpoint::list_stores_endpoint;

#[cfg(test)]
pub(crate) use core::test_store;
