//! Defines the core data model and database queries for savings accounts.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, account_ref::{AccountStatus, SavingsAccountId}};

/// A bank account the business can move store takings into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsAccount {
    /// The ID of the account in the application database.
    pub id: SavingsAccountId,
    /// The externally assigned account code, e.g. "SAV-01".
    pub code: String,
    /// The display name of the account.
    pub name: String,
    /// The kind of account, e.g. "term deposit".
    pub account_type: String,
    /// The bank holding the account.
    pub bank_name: Option<String>,
    /// The bank's account number.
    pub account_number: Option<String>,
    /// Whether the account may take part in new postings.
    pub status: AccountStatus,
    /// Free-form notes about the account.
    pub notes: Option<String>,
    /// When the account was added to the registry.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a savings account, or to fully replace one on
/// update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavingsAccount {
    /// The externally assigned account code. Must be unique.
    pub code: String,
    /// The display name of the account.
    pub name: String,
    /// The kind of account, e.g. "term deposit".
    pub account_type: String,
    /// The bank holding the account.
    pub bank_name: Option<String>,
    /// The bank's account number.
    pub account_number: Option<String>,
    /// Whether the account may take part in new postings.
    pub status: AccountStatus,
    /// Free-form notes about the account.
    pub notes: Option<String>,
}

/// Create the savings account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_account (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                account_type TEXT NOT NULL,
                bank_name TEXT,
                account_number TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                notes TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new savings account in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateSavingsAccountCode] if an account with the same code
///   already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_savings_account(
    new: NewSavingsAccount,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    connection
        .prepare(
            "INSERT INTO savings_account
                (code, name, account_type, bank_name, account_number, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, code, name, account_type, bank_name, account_number, status, notes,
                created_at",
        )?
        .query_row(
            (
                &new.code,
                &new.name,
                &new.account_type,
                &new.bank_name,
                &new.account_number,
                new.status.as_str(),
                &new.notes,
                OffsetDateTime::now_utc(),
            ),
            map_savings_account_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateSavingsAccountCode(new.code.clone()),
            error => error.into(),
        })
}

/// Retrieve a savings account from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid savings account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_savings_account(
    id: SavingsAccountId,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    let account = connection
        .prepare(
            "SELECT id, code, name, account_type, bank_name, account_number, status, notes,
                created_at
             FROM savings_account WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_savings_account_row)?;

    Ok(account)
}

/// Retrieve all savings accounts, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_savings_accounts(connection: &Connection) -> Result<Vec<SavingsAccount>, Error> {
    connection
        .prepare(
            "SELECT id, code, name, account_type, bank_name, account_number, status, notes,
                created_at
             FROM savings_account ORDER BY created_at DESC, id DESC",
        )?
        .query_map([], map_savings_account_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Replace the named fields of the savings account with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingSavingsAccount] if `id` does not refer to a valid
///   savings account,
/// - [Error::DuplicateSavingsAccountCode] if the new code collides with
///   another account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_savings_account(
    id: SavingsAccountId,
    new: NewSavingsAccount,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    let rows_updated = connection
        .execute(
            "UPDATE savings_account
             SET code = ?1, name = ?2, account_type = ?3, bank_name = ?4, account_number = ?5,
                status = ?6, notes = ?7
             WHERE id = ?8",
            (
                &new.code,
                &new.name,
                &new.account_type,
                &new.bank_name,
                &new.account_number,
                new.status.as_str(),
                &new.notes,
                id,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateSavingsAccountCode(new.code.clone()),
            error => error.into(),
        })?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingSavingsAccount);
    }

    get_savings_account(id, connection)
}

/// Delete the savings account with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingSavingsAccount] if `id` does not refer to a valid
///   savings account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_savings_account(id: SavingsAccountId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM savings_account WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingSavingsAccount);
    }

    Ok(())
}

/// Map a database row to a [SavingsAccount].
pub(crate) fn map_savings_account_row(row: &Row) -> Result<SavingsAccount, rusqlite::Error> {
    let raw_status: String = row.get(6)?;
    let status = AccountStatus::parse(&raw_status).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("invalid savings account status {raw_status:?}").into(),
        )
    })?;

    Ok(SavingsAccount {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        account_type: row.get(3)?,
        bank_name: row.get(4)?,
        account_number: row.get(5)?,
        status,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
pub(crate) fn test_savings_account(code: &str) -> NewSavingsAccount {
    NewSavingsAccount {
        code: code.to_string(),
        name: format!("{code} savings"),
        account_type: "savings".to_string(),
        bank_name: Some("Example Bank".to_string()),
        account_number: None,
        status: AccountStatus::Active,
        notes: None,
    }
}

#[cfg(test)]
mod savings_account_tests {
    use rusqlite::Connection;

    use crate::{Error, account_ref::AccountStatus, db::initialize};

    use super::{
        create_savings_account, delete_savings_account, get_savings_account,
        list_savings_accounts, test_savings_account, update_savings_account,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let account = create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();

        assert!(account.id > 0);
        assert_eq!(account.code, "SAV-01");
        assert_eq!(account.status, AccountStatus::Active);
    }

    #[test]
    fn create_fails_on_duplicate_code() {
        let conn = get_test_connection();
        create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();

        let result = create_savings_account(test_savings_account("SAV-01"), &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateSavingsAccountCode("SAV-01".to_string()))
        );
    }

    #[test]
    fn update_replaces_fields() {
        let conn = get_test_connection();
        let inserted = create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();

        let mut new = test_savings_account("SAV-01");
        new.name = "Emergency fund".to_string();
        new.status = AccountStatus::Stopped;
        let updated = update_savings_account(inserted.id, new, &conn).unwrap();

        assert_eq!(updated.name, "Emergency fund");
        assert_eq!(updated.status, AccountStatus::Stopped);
    }

    #[test]
    fn update_fails_on_missing_account() {
        let conn = get_test_connection();

        let result = update_savings_account(1337, test_savings_account("SAV-01"), &conn);

        assert_eq!(result, Err(Error::UpdateMissingSavingsAccount));
    }

    #[test]
    fn delete_removes_account() {
        let conn = get_test_connection();
        let inserted = create_savings_account(test_savings_account("SAV-01"), &conn).unwrap();

        delete_savings_account(inserted.id, &conn).unwrap();

        assert_eq!(
            get_savings_account(inserted.id, &conn),
            Err(Error::NotFound)
        );
        assert!(list_savings_accounts(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_fails_on_missing_account() {
        let conn = get_test_connection();

        let result = delete_savings_account(1337, &conn);

        assert_eq!(result, Err(Error::DeleteMissingSavingsAccount));
    }
}
