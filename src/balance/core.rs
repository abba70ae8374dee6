//! Defines the balance ledger and the two operations that move it.
//!
//! Each funding source has at most one row holding its current balance.
//! Rows are created lazily by the first movement that touches the account:
//! the entry starts at that movement's signed amount.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, account_ref::{AccountKind, AccountRef, DatabaseId}};

/// The current balance of one funding source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// The ID of the entry in the application database.
    pub id: DatabaseId,
    /// The funding source this entry belongs to.
    #[serde(flatten)]
    pub account: AccountRef,
    /// The current balance. May be negative.
    pub current_balance: f64,
    /// When the balance last moved.
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Create the balance ledger table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_balance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS cash_balance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_kind TEXT NOT NULL,
                account_id INTEGER NOT NULL,
                current_balance REAL NOT NULL,
                last_updated TEXT NOT NULL,
                UNIQUE(account_kind, account_id)
                )",
        (),
    )?;

    Ok(())
}

/// Add `delta` to the account's balance and return the updated entry.
///
/// Creates the entry with `current_balance = delta` if the account has none
/// yet. The increment happens inside a single upsert statement, so there is
/// no read-modify-write window for a concurrent posting to interleave with.
///
/// The existence of the account itself is not checked here; callers are
/// expected to validate the account before posting movements against it.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn apply_delta(
    account: AccountRef,
    delta: f64,
    connection: &Connection,
) -> Result<BalanceEntry, Error> {
    let entry = connection
        .prepare(
            "INSERT INTO cash_balance (account_kind, account_id, current_balance, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (account_kind, account_id) DO UPDATE SET
                current_balance = cash_balance.current_balance + excluded.current_balance,
                last_updated = excluded.last_updated
             RETURNING id, account_kind, account_id, current_balance, last_updated",
        )?
        .query_row(
            (
                account.kind().as_str(),
                account.id(),
                delta,
                OffsetDateTime::now_utc(),
            ),
            map_balance_row,
        )?;

    Ok(entry)
}

/// Overwrite the account's balance with `value` and return the updated entry.
///
/// Used only for manual adjustment postings; regular movements go through
/// [apply_delta].
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn set_absolute(
    account: AccountRef,
    value: f64,
    connection: &Connection,
) -> Result<BalanceEntry, Error> {
    let entry = connection
        .prepare(
            "INSERT INTO cash_balance (account_kind, account_id, current_balance, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (account_kind, account_id) DO UPDATE SET
                current_balance = excluded.current_balance,
                last_updated = excluded.last_updated
             RETURNING id, account_kind, account_id, current_balance, last_updated",
        )?
        .query_row(
            (
                account.kind().as_str(),
                account.id(),
                value,
                OffsetDateTime::now_utc(),
            ),
            map_balance_row,
        )?;

    Ok(entry)
}

/// Retrieve the balance entry for `account`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account has no balance entry yet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_balance(account: AccountRef, connection: &Connection) -> Result<BalanceEntry, Error> {
    let entry = connection
        .prepare(
            "SELECT id, account_kind, account_id, current_balance, last_updated
             FROM cash_balance
             WHERE account_kind = ?1 AND account_id = ?2",
        )?
        .query_one((account.kind().as_str(), account.id()), map_balance_row)?;

    Ok(entry)
}

/// Retrieve every balance entry, stores first, then by account ID.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_balances(connection: &Connection) -> Result<Vec<BalanceEntry>, Error> {
    connection
        .prepare(
            "SELECT id, account_kind, account_id, current_balance, last_updated
             FROM cash_balance
             ORDER BY account_kind DESC, account_id",
        )?
        .query_map([], map_balance_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Map a database row to a [BalanceEntry].
pub(crate) fn map_balance_row(row: &Row) -> Result<BalanceEntry, rusqlite::Error> {
    let raw_kind: String = row.get(1)?;
    let kind = AccountKind::parse(&raw_kind).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("invalid account kind {raw_kind:?}").into(),
        )
    })?;

    Ok(BalanceEntry {
        id: row.get(0)?,
        account: AccountRef::new(kind, row.get(2)?),
        current_balance: row.get(3)?,
        last_updated: row.get(4)?,
    })
}

#[cfg(test)]
mod balance_tests {
    use rusqlite::Connection;

    use crate::{Error, account_ref::AccountRef, db::initialize};

    use super::{apply_delta, get_balance, list_balances, set_absolute};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn first_delta_creates_entry_with_signed_amount() {
        let conn = get_test_connection();
        let account = AccountRef::Store(1);

        let entry = apply_delta(account, -75.5, &conn).unwrap();

        assert_eq!(entry.account, account);
        assert_eq!(entry.current_balance, -75.5);
    }

    #[test]
    fn deltas_accumulate() {
        let conn = get_test_connection();
        let account = AccountRef::Store(1);

        apply_delta(account, 100.0, &conn).unwrap();
        apply_delta(account, -30.0, &conn).unwrap();
        let entry = apply_delta(account, 12.5, &conn).unwrap();

        assert_eq!(entry.current_balance, 82.5);
    }

    #[test]
    fn entries_are_separate_per_account() {
        let conn = get_test_connection();

        apply_delta(AccountRef::Store(1), 100.0, &conn).unwrap();
        apply_delta(AccountRef::Savings(1), 50.0, &conn).unwrap();

        let store_entry = get_balance(AccountRef::Store(1), &conn).unwrap();
        let savings_entry = get_balance(AccountRef::Savings(1), &conn).unwrap();
        assert_eq!(store_entry.current_balance, 100.0);
        assert_eq!(savings_entry.current_balance, 50.0);
    }

    #[test]
    fn at_most_one_entry_per_account() {
        let conn = get_test_connection();
        let account = AccountRef::Store(1);

        apply_delta(account, 100.0, &conn).unwrap();
        apply_delta(account, 50.0, &conn).unwrap();
        set_absolute(account, 10.0, &conn).unwrap();

        assert_eq!(list_balances(&conn).unwrap().len(), 1);
    }

    #[test]
    fn set_absolute_overwrites_instead_of_adding() {
        let conn = get_test_connection();
        let account = AccountRef::Savings(3);

        apply_delta(account, 100.0, &conn).unwrap();
        let entry = set_absolute(account, 42.0, &conn).unwrap();

        assert_eq!(entry.current_balance, 42.0);
    }

    #[test]
    fn get_balance_fails_when_account_has_no_entry() {
        let conn = get_test_connection();

        let result = get_balance(AccountRef::Store(9), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn list_orders_stores_before_savings() {
        let conn = get_test_connection();
        apply_delta(AccountRef::Savings(1), 1.0, &conn).unwrap();
        apply_delta(AccountRef::Store(2), 1.0, &conn).unwrap();
        apply_delta(AccountRef::Store(1), 1.0, &conn).unwrap();

        let entries = list_balances(&conn).unwrap();

        let accounts: Vec<_> = entries.into_iter().map(|entry| entry.account).collect();
        assert_eq!(
            accounts,
            vec![
                AccountRef::Store(1),
                AccountRef::Store(2),
                AccountRef::Savings(1)
            ]
        );
    }
}
