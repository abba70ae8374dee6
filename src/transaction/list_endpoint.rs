//! Defines the endpoint for listing the transaction log.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account_ref::{AccountKind, AccountRef},
    pagination::{PageQuery, PaginationConfig},
    transaction::{TransactionRecord, list_transactions},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The config that controls how pages of transactions are served.
    pub pagination_config: PaginationConfig,
    /// The database connection for the transaction log.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the transaction listing.
///
/// The pagination fields are spelled out instead of flattening [PageQuery]
/// in: query-string deserialization cannot see through `serde(flatten)` for
/// numeric fields.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    /// Restrict the listing to accounts of this kind.
    pub account_kind: Option<AccountKind>,
    /// Restrict the listing to one account. Requires `account_kind` context;
    /// the kind defaults to `store` when only an ID is given.
    pub account_id: Option<i64>,
    /// The one-indexed page to return.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub page_size: Option<u64>,
}

/// A route handler for listing postings, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionRecord>>, Error> {
    let account = query.account_id.map(|account_id| {
        AccountRef::new(
            query.account_kind.unwrap_or(AccountKind::Store),
            account_id,
        )
    });
    let page = PageQuery {
        page: query.page,
        page_size: query.page_size,
    };
    let (limit, offset) = page.to_limit_offset(&state.pagination_config);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let records = list_transactions(account, limit, offset, &connection)?;

    Ok(Json(records))
}

#[cfg(test)]
mod list_transactions_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account_ref::AccountRef,
        db::initialize,
        pagination::PaginationConfig,
        transaction::{TransactionKind, create_transaction, test_posting},
    };

    use super::{ListTransactionsState, TransactionListQuery, list_transactions_endpoint};

    fn get_test_state() -> ListTransactionsState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let day = date!(2024 - 01 - 05);
        for store_id in [1, 1, 2] {
            create_transaction(
                test_posting(
                    AccountRef::Store(store_id),
                    TransactionKind::Income,
                    10.0,
                    day,
                ),
                &conn,
            )
            .unwrap();
        }

        ListTransactionsState {
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn lists_all_postings() {
        let state = get_test_state();

        let response = list_transactions_endpoint(
            State(state),
            Query(TransactionListQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.0.len(), 3);
    }

    #[tokio::test]
    async fn filters_by_account_id() {
        let state = get_test_state();
        let query = TransactionListQuery {
            account_kind: None,
            account_id: Some(2),
            page: None,
            page_size: None,
        };

        let response = list_transactions_endpoint(State(state), Query(query))
            .await
            .unwrap();

        assert_eq!(response.0.len(), 1);
        assert_eq!(response.0[0].account, AccountRef::Store(2));
    }
}
