//! Session-cookie authentication for the JSON API.
//!
//! A successful log-in stores a serialized [Token] in an encrypted private
//! cookie. The auth middleware validates the token on every protected
//! request, exposes the user ID as a request extension, and extends the
//! sliding expiry.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod session;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::get_log_out;
pub use middleware::auth_guard;
pub use session::get_session;
pub(super) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub(crate) use middleware::AuthState;
