//! Defines the endpoint for posting manual balance movements.
//!
//! Regular postings move the ledger through the transaction and transfer
//! endpoints; this endpoint exists for corrections. The `adjustment` kind
//! overwrites the stored balance instead of adding to it.

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
    balance::{BalanceEntry, apply_delta, set_absolute},
};

/// The state needed to adjust a balance.
#[derive(Debug, Clone)]
pub struct AdjustBalanceState {
    /// The database connection for the balance ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdjustBalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// How a manual balance movement is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Add the amount to the balance.
    Income,
    /// Subtract the amount from the balance.
    Expense,
    /// Subtract the amount from the balance.
    Transfer,
    /// Overwrite the balance with the exact amount.
    Adjustment,
}

/// The JSON body for a manual balance movement.
#[derive(Debug, Deserialize)]
pub struct AdjustBalanceData {
    /// Which registry the account lives in.
    pub account_kind: AccountKind,
    /// The account's ID within that registry.
    pub account_id: i64,
    /// The amount to apply. Must be positive except for `adjustment`, which
    /// takes the exact (possibly negative) balance to store.
    pub amount: f64,
    /// How the amount is applied.
    pub kind: AdjustmentKind,
}

/// A route handler for posting a manual balance movement.
pub async fn adjust_balance_endpoint(
    State(state): State<AdjustBalanceState>,
    Json(data): Json<AdjustBalanceData>,
) -> Result<Response, Error> {
    let account = AccountRef::new(data.account_kind, data.account_id);

    if data.kind != AdjustmentKind::Adjustment && data.amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let entry: BalanceEntry = match data.kind {
        AdjustmentKind::Income => apply_delta(account, data.amount, &connection)?,
        AdjustmentKind::Expense | AdjustmentKind::Transfer => {
            apply_delta(account, -data.amount, &connection)?
        }
        AdjustmentKind::Adjustment => set_absolute(account, data.amount, &connection)?,
    };

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

#[cfg(test)]
mod adjust_balance_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error,
        account_ref::{AccountKind, AccountRef},
        balance::{apply_delta, get_balance},
        db::initialize,
    };

    use super::{AdjustBalanceData, AdjustBalanceState, AdjustmentKind, adjust_balance_endpoint};

    fn get_test_state() -> AdjustBalanceState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        AdjustBalanceState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn income_adds_to_balance() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            apply_delta(AccountRef::Store(1), 100.0, &connection).unwrap();
        }

        adjust_balance_endpoint(
            State(state.clone()),
            Json(AdjustBalanceData {
                account_kind: AccountKind::Store,
                account_id: 1,
                amount: 25.0,
                kind: AdjustmentKind::Income,
            }),
        )
        .await
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let entry = get_balance(AccountRef::Store(1), &connection).unwrap();
        assert_eq!(entry.current_balance, 125.0);
    }

    #[tokio::test]
    async fn expense_subtracts_from_balance() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            apply_delta(AccountRef::Store(1), 100.0, &connection).unwrap();
        }

        adjust_balance_endpoint(
            State(state.clone()),
            Json(AdjustBalanceData {
                account_kind: AccountKind::Store,
                account_id: 1,
                amount: 25.0,
                kind: AdjustmentKind::Expense,
            }),
        )
        .await
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let entry = get_balance(AccountRef::Store(1), &connection).unwrap();
        assert_eq!(entry.current_balance, 75.0);
    }

    #[tokio::test]
    async fn adjustment_overwrites_balance() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            apply_delta(AccountRef::Store(1), 100.0, &connection).unwrap();
        }

        adjust_balance_endpoint(
            State(state.clone()),
            Json(AdjustBalanceData {
                account_kind: AccountKind::Store,
                account_id: 1,
                amount: -12.5,
                kind: AdjustmentKind::Adjustment,
            }),
        )
        .await
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let entry = get_balance(AccountRef::Store(1), &connection).unwrap();
        assert_eq!(entry.current_balance, -12.5);
    }

    #[tokio::test]
    async fn rejects_non_positive_amount_for_income() {
        let state = get_test_state();

        let result = adjust_balance_endpoint(
            State(state),
            Json(AdjustBalanceData {
                account_kind: AccountKind::Store,
                account_id: 1,
                amount: 0.0,
                kind: AdjustmentKind::Income,
            }),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::NonPositiveAmount);
    }
}
