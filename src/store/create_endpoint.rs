//! Defines the endpoint for adding a store to the registry.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account_ref::AccountStatus,
    store::{NewStore, create_store},
};

/// The state needed to create a store.
#[derive(Debug, Clone)]
pub struct CreateStoreState {
    /// The database connection for managing stores.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateStoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating or replacing a store.
#[derive(Debug, Deserialize)]
pub struct StoreData {
    /// The externally assigned store code.
    pub code: String,
    /// The branch name shown in listings.
    pub branch: String,
    /// The street address of the branch.
    pub address: String,
    /// A contact phone number for the branch.
    pub phone: Option<String>,
    /// A contact email address for the branch.
    pub email: Option<String>,
    /// The lifecycle status, defaulting to active when omitted.
    pub status: Option<AccountStatus>,
}

impl StoreData {
    /// Check the mandatory fields and convert into the insertable form.
    pub(crate) fn into_new_store(self) -> Result<NewStore, Error> {
        if self.code.is_empty() {
            return Err(Error::MissingField("code"));
        }

        if self.branch.is_empty() {
            return Err(Error::MissingField("branch"));
        }

        if self.address.is_empty() {
            return Err(Error::MissingField("address"));
        }

        Ok(NewStore {
            code: self.code,
            branch: self.branch,
            address: self.address,
            phone: self.phone,
            email: self.email,
            status: self.status.unwrap_or(AccountStatus::Active),
        })
    }
}

/// A route handler for adding a store to the registry.
pub async fn create_store_endpoint(
    State(state): State<CreateStoreState>,
    Json(data): Json<StoreData>,
) -> Result<Response, Error> {
    let new_store = data.into_new_store()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let store = create_store(new_store, &connection)?;

    Ok((StatusCode::CREATED, Json(store)).into_response())
}
