//! Defines the endpoint that triggers the daily snapshot computation.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account_ref::{AccountKind, AccountRef},
    history::{DailyHistoryRecord, compute_snapshot},
};

/// The state needed to compute a snapshot.
#[derive(Debug, Clone)]
pub struct CreateSnapshotState {
    /// The database connection for the history table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSnapshotState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn default_account_kind() -> AccountKind {
    AccountKind::Store
}

/// The JSON body for triggering a snapshot computation.
#[derive(Debug, Deserialize)]
pub struct SnapshotData {
    /// Which registry the account lives in. Defaults to `store`.
    #[serde(default = "default_account_kind")]
    pub account_kind: AccountKind,
    /// The account's ID within that registry.
    pub account_id: i64,
    /// The calendar day to compute.
    pub date: Date,
}

/// A route handler that computes (or recomputes) one account's snapshot for
/// one day.
pub async fn create_snapshot_endpoint(
    State(state): State<CreateSnapshotState>,
    Json(data): Json<SnapshotData>,
) -> Result<Response, Error> {
    let account = AccountRef::new(data.account_kind, data.account_id);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let record: DailyHistoryRecord = compute_snapshot(account, data.date, &connection)?;

    Ok((StatusCode::CREATED, Json(record)).into_response())
}
