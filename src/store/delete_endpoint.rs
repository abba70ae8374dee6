//! Defines the endpoint for removing a store from the registry.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, Error, account_ref::StoreId, store::delete_store};

/// The state needed to delete a store.
#[derive(Debug, Clone)]
pub struct DeleteStoreState {
    /// The database connection for managing stores.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteStoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a store by its ID.
pub async fn delete_store_endpoint(
    State(state): State<DeleteStoreState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Value>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_store(store_id, &connection)?;

    Ok(Json(json!({ "message": "Store deleted successfully" })))
}
