//! Defines the endpoint for listing the savings-account registry.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, savings::{SavingsAccount, list_savings_accounts}};

/// The state needed to list savings accounts.
#[derive(Debug, Clone)]
pub struct ListSavingsAccountsState {
    /// The database connection for managing savings accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListSavingsAccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing all savings accounts, newest first.
pub async fn list_savings_accounts_endpoint(
    State(state): State<ListSavingsAccountsState>,
) -> Result<Json<Vec<SavingsAccount>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let accounts = list_savings_accounts(&connection)?;

    Ok(Json(accounts))
}

#[cfg(test)]
mod list_savings_accounts_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        savings::{create_savings_account, test_savings_account},
    };

    use super::{ListSavingsAccountsState, list_savings_accounts_endpoint};

    #[tokio::test]
    async fn lists_all_accounts() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();
        create_savings_account(test_savings_account("SAV-02"), &conn).unwrap();
        let state = ListSavingsAccountsState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_savings_accounts_endpoint(State(state)).await.unwrap();

        assert_eq!(response.0.len(), 2);
    }
}
