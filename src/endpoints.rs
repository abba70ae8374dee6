//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/stores/{store_id}', use
//! [format_endpoint].

/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route describing the current session's identity.
pub const SESSION: &str = "/api/session";
/// The route to list and create stores.
pub const STORES: &str = "/api/stores";
/// The route to update or delete a single store.
pub const STORE: &str = "/api/stores/{store_id}";
/// The route to list and create savings accounts.
pub const SAVINGS_ACCOUNTS: &str = "/api/savings_accounts";
/// The route to update or delete a single savings account.
pub const SAVINGS_ACCOUNT: &str = "/api/savings_accounts/{account_id}";
/// The route to list and post transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to list transfers and run the transfer workflow.
pub const TRANSFERS: &str = "/api/transfers";
/// The route to list balance entries and post manual adjustments.
pub const CASH_BALANCE: &str = "/api/cash_balance";
/// The route to list daily snapshots and trigger snapshot computation.
pub const CASH_HISTORY: &str = "/api/cash_history";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/stores/{store_id}', '{store_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::SESSION);
        assert_endpoint_is_valid_uri(endpoints::STORES);
        assert_endpoint_is_valid_uri(endpoints::STORE);
        assert_endpoint_is_valid_uri(endpoints::SAVINGS_ACCOUNTS);
        assert_endpoint_is_valid_uri(endpoints::SAVINGS_ACCOUNT);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSFERS);
        assert_endpoint_is_valid_uri(endpoints::CASH_BALANCE);
        assert_endpoint_is_valid_uri(endpoints::CASH_HISTORY);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::STORE, 1);

        assert_eq!(formatted_path, "/api/stores/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint(endpoints::STORES, 1);

        assert_eq!(formatted_path, "/api/stores");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
