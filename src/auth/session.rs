//! Defines the endpoint describing the current session's identity.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    user::{UserID, get_user_by_id},
};

/// The state needed to describe the current session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The database connection for looking up the logged-in user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The identity of the logged-in user.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The logged-in user's ID.
    pub user_id: UserID,
    /// The logged-in user's email address.
    pub email: String,
}

/// A route handler that returns the identity behind the session cookie.
///
/// The auth middleware has already validated the cookie and provided the
/// user ID extension by the time this handler runs.
pub async fn get_session(
    State(state): State<SessionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<SessionResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let user = get_user_by_id(user_id, &connection)?;

    Ok(Json(SessionResponse {
        user_id: user.id,
        email: user.email,
    }))
}
