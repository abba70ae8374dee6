//! Tillbook is a bookkeeping backend for small point-of-sale businesses.
//!
//! This library provides a JSON REST API for managing stores, savings
//! accounts, cash balances, transactions, inter-account transfers, and
//! daily cash-history snapshots.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod account_ref;
mod app_state;
mod auth;
pub mod balance;
mod db;
pub mod endpoints;
pub mod history;
mod logging;
pub mod pagination;
mod password;
mod routing;
pub mod savings;
pub mod store;
mod timezone;
pub mod transaction;
pub mod transfer;
pub mod user;

pub use account_ref::{AccountKind, AccountRef, AccountStatus};
pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::{PageQuery, PaginationConfig};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, create_user, get_user_by_email, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client provided an invalid email/password combination, or no
    /// valid session cookie.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A required request field was missing or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A monetary amount was zero or negative where a positive amount is
    /// required.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    /// An account status string did not name a valid status.
    #[error("{0:?} is not a valid account status")]
    InvalidStatus(String),

    /// An account kind string did not name a valid account kind.
    #[error("{0:?} is not a valid account kind")]
    InvalidAccountKind(String),

    /// A balance adjustment kind string did not name a valid kind.
    #[error("{0:?} is not a valid adjustment kind")]
    InvalidAdjustmentKind(String),

    /// A transaction kind string did not name a valid kind.
    #[error("{0:?} is not a valid transaction kind")]
    InvalidTransactionKind(String),

    /// The referenced account is not active and may not take part in new
    /// transactions or transfers.
    #[error("{0} is not active")]
    InactiveAccount(AccountRef),

    /// A transfer named the same account as both source and destination.
    #[error("cannot transfer between an account and itself")]
    SameAccountTransfer,

    /// The specified store code already exists in the database.
    #[error("the store code \"{0}\" already exists in the database")]
    DuplicateStoreCode(String),

    /// The specified savings account code already exists in the database.
    #[error("the savings account code \"{0}\" already exists in the database")]
    DuplicateSavingsAccountCode(String),

    /// Tried to update a store that does not exist.
    #[error("tried to update a store that is not in the database")]
    UpdateMissingStore,

    /// Tried to delete a store that does not exist.
    #[error("tried to delete a store that is not in the database")]
    DeleteMissingStore,

    /// Tried to update a savings account that does not exist.
    #[error("tried to update a savings account that is not in the database")]
    UpdateMissingSavingsAccount,

    /// Tried to delete a savings account that does not exist.
    #[error("tried to delete a savings account that is not in the database")]
    DeleteMissingSavingsAccount,

    /// The first step of the transfer workflow failed. No state was mutated.
    ///
    /// The wrapped string is the underlying cause; it is logged on the
    /// server and never shown to the client.
    #[error("failed to create outgoing transaction")]
    TransferOutgoingFailed(String),

    /// The second step of the transfer workflow failed. The outgoing leg was
    /// deleted before this error was returned.
    #[error("failed to create incoming transaction")]
    TransferIncomingFailed(String),

    /// The third step of the transfer workflow failed. Both legs were
    /// deleted before this error was returned.
    #[error("failed to create transfer record")]
    TransferRecordFailed(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code that should accompany this error.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::CookieMissing => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::MissingField(_)
            | Error::NonPositiveAmount
            | Error::InvalidStatus(_)
            | Error::InvalidAccountKind(_)
            | Error::InvalidAdjustmentKind(_)
            | Error::InvalidTransactionKind(_)
            | Error::InactiveAccount(_)
            | Error::SameAccountTransfer
            | Error::DuplicateStoreCode(_)
            | Error::DuplicateSavingsAccountCode(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingStore
            | Error::DeleteMissingStore
            | Error::UpdateMissingSavingsAccount
            | Error::DeleteMissingSavingsAccount => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = match &self {
            // Internal details are not intended to be shown to the client.
            Error::HashingError(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
                "an internal error occurred, check the server logs for more details".to_string()
            }
            Error::TransferOutgoingFailed(cause)
            | Error::TransferIncomingFailed(cause)
            | Error::TransferRecordFailed(cause) => {
                tracing::error!("Transfer step failed: {self}: {cause}");
                self.to_string()
            }
            error => error.to_string(),
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
