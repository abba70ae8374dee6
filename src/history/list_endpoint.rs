//! Defines the endpoint for listing daily snapshots.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account_ref::{AccountKind, AccountRef},
    history::{DailyHistoryRecord, list_history},
};

/// The state needed to list snapshots.
#[derive(Debug, Clone)]
pub struct ListHistoryState {
    /// The database connection for the history table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListHistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the history listing.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryListQuery {
    /// Restrict the listing to accounts of this kind.
    pub account_kind: Option<AccountKind>,
    /// Restrict the listing to one account; the kind defaults to `store`
    /// when only an ID is given.
    pub account_id: Option<i64>,
    /// Restrict the listing to one calendar day.
    pub date: Option<Date>,
}

/// A route handler for listing snapshots, newest day first.
pub async fn list_history_endpoint(
    State(state): State<ListHistoryState>,
    Query(query): Query<HistoryListQuery>,
) -> Result<Json<Vec<DailyHistoryRecord>>, Error> {
    let account = query.account_id.map(|account_id| {
        AccountRef::new(
            query.account_kind.unwrap_or(AccountKind::Store),
            account_id,
        )
    });

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let records = list_history(account, query.date, &connection)?;

    Ok(Json(records))
}
