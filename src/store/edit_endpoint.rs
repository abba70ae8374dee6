//! Defines the endpoint for replacing a store's details.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account_ref::StoreId,
    store::{Store, create_endpoint::StoreData, update_store},
};

/// The state needed to update a store.
#[derive(Debug, Clone)]
pub struct EditStoreState {
    /// The database connection for managing stores.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditStoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that fully replaces the named fields of a store.
pub async fn edit_store_endpoint(
    State(state): State<EditStoreState>,
    Path(store_id): Path<StoreId>,
    Json(data): Json<StoreData>,
) -> Result<Json<Store>, Error> {
    let new_store = data.into_new_store()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let store = update_store(store_id, new_store, &connection)?;

    Ok(Json(store))
}
