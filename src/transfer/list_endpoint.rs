//! Defines the endpoint for listing transfers with their legs expanded.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, transfer::{TransferWithLegs, list_transfers}};

/// The state needed to list transfers.
#[derive(Debug, Clone)]
pub struct ListTransfersState {
    /// The database connection for the transfer records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransfersState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing all transfers, newest first, with both legs
/// expanded.
pub async fn list_transfers_endpoint(
    State(state): State<ListTransfersState>,
) -> Result<Json<Vec<TransferWithLegs>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let transfers = list_transfers(&connection)?;

    Ok(Json(transfers))
}
