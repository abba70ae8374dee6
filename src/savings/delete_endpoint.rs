//! Defines the endpoint for removing a savings account from the registry.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, Error, account_ref::SavingsAccountId, savings::delete_savings_account};

/// The state needed to delete a savings account.
#[derive(Debug, Clone)]
pub struct DeleteSavingsAccountState {
    /// The database connection for managing savings accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteSavingsAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a savings account by its ID.
pub async fn delete_savings_account_endpoint(
    State(state): State<DeleteSavingsAccountState>,
    Path(account_id): Path<SavingsAccountId>,
) -> Result<Json<Value>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_savings_account(account_id, &connection)?;

    Ok(Json(json!({ "message": "Savings account deleted successfully" })))
}

#[cfg(test)]
mod delete_savings_account_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        savings::{create_savings_account, list_savings_accounts, test_savings_account},
    };

    use super::{DeleteSavingsAccountState, delete_savings_account_endpoint};

    #[tokio::test]
    async fn deletes_account() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let account = create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();
        let state = DeleteSavingsAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        delete_savings_account_endpoint(State(state.clone()), Path(account.id))
            .await
            .unwrap();

        let connection = state.db_connection.lock().unwrap();
        assert!(list_savings_accounts(&connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_account_returns_not_found_error() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = DeleteSavingsAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result = delete_savings_account_endpoint(State(state), Path(1337)).await;

        assert_eq!(result.unwrap_err(), Error::DeleteMissingSavingsAccount);
    }
}
