//! Defines the endpoint for adding a savings account to the registry.

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
    account_ref::{AccountRef, AccountStatus},
    balance::set_absolute,
    savings::{NewSavingsAccount, create_savings_account},
};

/// The state needed to create a savings account.
#[derive(Debug, Clone)]
pub struct CreateSavingsAccountState {
    /// The database connection for managing savings accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSavingsAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating or replacing a savings account.
#[derive(Debug, Deserialize)]
pub struct SavingsAccountData {
    /// The externally assigned account code.
    pub code: String,
    /// The display name of the account.
    pub name: String,
    /// The kind of account, e.g. "term deposit".
    pub account_type: String,
    /// The bank holding the account.
    pub bank_name: Option<String>,
    /// The bank's account number.
    pub account_number: Option<String>,
    /// The opening balance to seed the ledger with. Only honored at creation.
    pub current_balance: Option<f64>,
    /// The lifecycle status, defaulting to active when omitted.
    pub status: Option<AccountStatus>,
    /// Free-form notes about the account.
    pub notes: Option<String>,
}

impl SavingsAccountData {
    /// Check the mandatory fields and convert into the insertable form.
    pub(crate) fn into_new_account(self) -> Result<NewSavingsAccount, Error> {
        if self.code.is_empty() {
            return Err(Error::MissingField("code"));
        }

        if self.name.is_empty() {
            return Err(Error::MissingField("name"));
        }

        if self.account_type.is_empty() {
            return Err(Error::MissingField("account_type"));
        }

        Ok(NewSavingsAccount {
            code: self.code,
            name: self.name,
            account_type: self.account_type,
            bank_name: self.bank_name,
            account_number: self.account_number,
            status: self.status.unwrap_or(AccountStatus::Active),
            notes: self.notes,
        })
    }
}

/// A route handler for adding a savings account to the registry.
///
/// A non-zero `current_balance` in the request seeds the account's balance
/// ledger entry with that opening value.
pub async fn create_savings_account_endpoint(
    State(state): State<CreateSavingsAccountState>,
    Json(data): Json<SavingsAccountData>,
) -> Result<Response, Error> {
    let opening_balance = data.current_balance.unwrap_or(0.0);
    let new_account = data.into_new_account()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let account = create_savings_account(new_account, &connection)?;

    if opening_balance != 0.0 {
        set_absolute(AccountRef::Savings(account.id), opening_balance, &connection)?;
    }

    Ok((StatusCode::CREATED, Json(account)).into_response())
}
