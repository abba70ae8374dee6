//! Defines the endpoint for listing the store registry.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, store::{Store, list_stores}};

/// The state needed to list stores.
#[derive(Debug, Clone)]
pub struct ListStoresState {
    /// The database connection for managing stores.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListStoresState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing all stores, newest first.
pub async fn list_stores_endpoint(
    State(state): State<ListStoresState>,
) -> Result<Json<Vec<Store>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let stores = list_stores(&connection)?;

    Ok(Json(stores))
}
