//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{auth_guard, get_log_out, get_session, post_log_in},
    balance::{adjust_balance_endpoint, list_balances_endpoint},
    endpoints,
    history::{create_snapshot_endpoint, list_history_endpoint},
    savings::{
        create_savings_account_endpoint, delete_savings_account_endpoint,
        edit_savings_account_endpoint, list_savings_accounts_endpoint,
    },
    store::{
        create_store_endpoint, delete_store_endpoint, edit_store_endpoint, list_stores_endpoint,
    },
    transaction::{create_transaction_endpoint, list_transactions_endpoint},
    transfer::{create_transfer_endpoint, list_transfers_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::SESSION, get(get_session))
        .route(
            endpoints::STORES,
            get(list_stores_endpoint).post(create_store_endpoint),
        )
        .route(
            endpoints::STORE,
            put(edit_store_endpoint).delete(delete_store_endpoint),
        )
        .route(
            endpoints::SAVINGS_ACCOUNTS,
            get(list_savings_accounts_endpoint).post(create_savings_account_endpoint),
        )
        .route(
            endpoints::SAVINGS_ACCOUNT,
            put(edit_savings_account_endpoint).delete(delete_savings_account_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSFERS,
            get(list_transfers_endpoint).post(create_transfer_endpoint),
        )
        .route(
            endpoints::CASH_BALANCE,
            get(list_balances_endpoint).post(adjust_balance_endpoint),
        )
        .route(
            endpoints::CASH_HISTORY,
            get(list_history_endpoint).post(create_snapshot_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_not_found)
        .with_state(state)
}

/// The JSON body served for unknown routes.
async fn get_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
}
