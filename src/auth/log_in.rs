//! Defines the endpoint that exchanges an email/password pair for a session
//! cookie.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::set_auth_cookie,
    user::{UserID, get_user_by_email},
};

/// How long the session should last if the client selects "remember me" at
/// log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The JSON body for a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The staff member's email address.
    pub email: String,
    /// The raw password to check against the stored hash.
    pub password: String,
    /// Whether to keep the session alive for a week instead of the default
    /// sliding window.
    #[serde(default)]
    pub remember_me: bool,
}

/// The identity returned on a successful log-in.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    /// The logged-in user's ID.
    pub user_id: UserID,
    /// The logged-in user's email address.
    pub email: String,
}

/// A route handler that verifies credentials and sets the session cookie.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Json(data): Json<LogInData>,
) -> Result<Response, Error> {
    if data.email.is_empty() {
        return Err(Error::MissingField("email"));
    }

    if data.password.is_empty() {
        return Err(Error::MissingField("password"));
    }

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        // An unknown email gets the same error as a wrong password so the
        // endpoint does not reveal which emails are registered.
        get_user_by_email(&data.email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    let password_is_correct = user.password_hash.verify(&data.password).map_err(|error| {
        tracing::error!("Could not verify password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((
        jar,
        Json(SessionInfo {
            user_id: user.id,
            email: user.email,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use sha2::{Digest, Sha512};

    use crate::{
        PasswordHash,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        db::initialize,
        user::create_user,
    };

    use super::{LogInState, post_log_in};

    const TEST_EMAIL: &str = "staff@example.com";
    const TEST_PASSWORD: &str = "correcthorsebatterystaple";

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let password_hash = PasswordHash::from_raw_password(TEST_PASSWORD, 4).unwrap();
        create_user(TEST_EMAIL, password_hash, &conn).unwrap();

        let state = LogInState {
            cookie_key: Key::from(&Sha512::digest("a secret")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let app = Router::new()
            .route("/api/log_in", post(post_log_in))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn log_in_with_valid_credentials_sets_cookie() {
        let server = get_test_server();

        let response = server
            .post("/api/log_in")
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        assert!(!response.cookie(COOKIE_TOKEN).value().is_empty());
        response.assert_json_contains(&json!({ "email": TEST_EMAIL }));
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_returns_unauthorized() {
        let server = get_test_server();

        let response = server
            .post("/api/log_in")
            .json(&json!({ "email": TEST_EMAIL, "password": "thewrongpassword" }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_with_unknown_email_returns_unauthorized() {
        let server = get_test_server();

        let response = server
            .post("/api/log_in")
            .json(&json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_with_empty_email_returns_bad_request() {
        let server = get_test_server();

        let response = server
            .post("/api/log_in")
            .json(&json!({ "email": "", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn remember_me_extends_cookie_expiry() {
        let server = get_test_server();

        let response = server
            .post("/api/log_in")
            .json(&json!({
                "email": TEST_EMAIL,
                "password": TEST_PASSWORD,
                "remember_me": true
            }))
            .await;

        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_TOKEN);
        let expires = cookie.expires_datetime().unwrap();
        let days_until_expiry = (expires - time::OffsetDateTime::now_utc()).whole_days();
        assert!(
            days_until_expiry >= 6,
            "got cookie expiring in {days_until_expiry} days, want about a week"
        );
    }
}
