//! Defines the endpoint that runs the transfer workflow.

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
    account_ref::{AccountKind, AccountRef},
    timezone::current_local_date,
    transfer::{TransferOutcome, TransferRequest, execute_transfer},
};

/// The state needed to run a transfer.
#[derive(Debug, Clone)]
pub struct CreateTransferState {
    /// The local timezone used to resolve the transfer date.
    pub local_timezone: String,
    /// The database connection for the transfer workflow.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for running a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferData {
    /// Which registry the source account lives in.
    pub from_kind: AccountKind,
    /// The source account's ID.
    pub from_id: i64,
    /// Which registry the destination account lives in.
    pub to_kind: AccountKind,
    /// The destination account's ID.
    pub to_id: i64,
    /// The positive amount to move.
    pub amount: f64,
    /// Free-form notes carried onto the legs and the record.
    pub notes: Option<String>,
    /// The email of the staff member running the transfer.
    pub staff_email: Option<String>,
}

/// A route handler that moves money between two funding sources.
pub async fn create_transfer_endpoint(
    State(state): State<CreateTransferState>,
    Json(data): Json<TransferData>,
) -> Result<Response, Error> {
    let staff_email = data
        .staff_email
        .filter(|email| !email.is_empty())
        .ok_or(Error::MissingField("staff_email"))?;

    let request = TransferRequest {
        from: AccountRef::new(data.from_kind, data.from_id),
        to: AccountRef::new(data.to_kind, data.to_id),
        amount: data.amount,
        notes: data.notes,
        staff_email,
    };
    let transaction_date = current_local_date(&state.local_timezone);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let outcome: TransferOutcome = execute_transfer(request, transaction_date, &connection)?;

    tracing::info!(
        "Transfer {} completed: {} -> {} ({})",
        outcome.reference,
        outcome.transfer_record.from,
        outcome.transfer_record.to,
        outcome.transfer_record.amount,
    );

    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

#[cfg(test)]
mod create_transfer_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        Error,
        account_ref::{AccountKind, AccountRef},
        balance::{apply_delta, get_balance},
        db::initialize,
        savings::{create_savings_account, test_savings_account},
        store::{create_store, test_store},
    };

    use super::{CreateTransferState, TransferData, create_transfer_endpoint};

    fn get_test_state() -> CreateTransferState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_store(test_store("S-001"), &conn).unwrap();
        create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();
        apply_delta(AccountRef::Store(1), 100.0, &conn).unwrap();
        apply_delta(AccountRef::Savings(1), 50.0, &conn).unwrap();

        CreateTransferState {
            local_timezone: "Etc/UTC".to_string(),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn transfer_data() -> TransferData {
        TransferData {
            from_kind: AccountKind::Store,
            from_id: 1,
            to_kind: AccountKind::Savings,
            to_id: 1,
            amount: 30.0,
            notes: Some("end of day banking".to_string()),
            staff_email: Some("staff@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn transfer_returns_created_and_moves_balances() {
        let state = get_test_state();

        let response = create_transfer_endpoint(State(state.clone()), Json(transfer_data()))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_balance(AccountRef::Store(1), &connection)
                .unwrap()
                .current_balance,
            70.0
        );
        assert_eq!(
            get_balance(AccountRef::Savings(1), &connection)
                .unwrap()
                .current_balance,
            80.0
        );
    }

    #[tokio::test]
    async fn rejects_missing_staff_email() {
        let state = get_test_state();
        let data = TransferData {
            staff_email: None,
            ..transfer_data()
        };

        let result = create_transfer_endpoint(State(state), Json(data)).await;

        assert_eq!(result.unwrap_err(), Error::MissingField("staff_email"));
    }

    #[tokio::test]
    async fn rejects_same_account() {
        let state = get_test_state();
        let data = TransferData {
            to_kind: AccountKind::Store,
            to_id: 1,
            ..transfer_data()
        };

        let result = create_transfer_endpoint(State(state), Json(data)).await;

        assert_eq!(result.unwrap_err(), Error::SameAccountTransfer);
    }
}
