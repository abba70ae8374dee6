//! Defines the endpoint for replacing a savings account's details.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account_ref::SavingsAccountId,
    savings::{SavingsAccount, create_endpoint::SavingsAccountData, update_savings_account},
};

/// The state needed to update a savings account.
#[derive(Debug, Clone)]
pub struct EditSavingsAccountState {
    /// The database connection for managing savings accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditSavingsAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that fully replaces the named fields of a savings account.
///
/// The `current_balance` field is ignored on update; the ledger is only
/// moved by transactions, transfers, and explicit adjustments.
pub async fn edit_savings_account_endpoint(
    State(state): State<EditSavingsAccountState>,
    Path(account_id): Path<SavingsAccountId>,
    Json(data): Json<SavingsAccountData>,
) -> Result<Json<SavingsAccount>, Error> {
    let new_account = data.into_new_account()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let account = update_savings_account(account_id, new_account, &connection)?;

    Ok(Json(account))
}
