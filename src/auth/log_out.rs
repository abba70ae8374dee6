//! Log-out route handler that invalidates the session cookie.

use axum::{Json, response::{IntoResponse, Response}};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth::invalidate_auth_cookie;

/// Invalidate the session cookie.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(json!({ "message": "Logged out successfully" }))).into_response()
}
