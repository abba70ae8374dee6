//! Defines the endpoint for listing the balance ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, balance::{BalanceEntry, list_balances}};

/// The state needed to list balance entries.
#[derive(Debug, Clone)]
pub struct ListBalancesState {
    /// The database connection for the balance ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListBalancesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing every balance entry.
pub async fn list_balances_endpoint(
    State(state): State<ListBalancesState>,
) -> Result<Json<Vec<BalanceEntry>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let entries = list_balances(&connection)?;

    Ok(Json(entries))
}
