//! Defines the core data model and database queries for stores.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, account_ref::{AccountStatus, StoreId}};

/// A shop branch whose cash-in-hand position the ledger tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// The ID of the store in the application database.
    pub id: StoreId,
    /// The externally assigned store code, e.g. "S-001".
    pub code: String,
    /// The branch name shown in listings.
    pub branch: String,
    /// The street address of the branch.
    pub address: String,
    /// A contact phone number for the branch.
    pub phone: Option<String>,
    /// A contact email address for the branch.
    pub email: Option<String>,
    /// Whether the store may take part in new postings.
    pub status: AccountStatus,
    /// When the store was added to the registry.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a store, or to fully replace one on update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStore {
    /// The externally assigned store code. Must be unique.
    pub code: String,
    /// The branch name shown in listings.
    pub branch: String,
    /// The street address of the branch.
    pub address: String,
    /// A contact phone number for the branch.
    pub phone: Option<String>,
    /// A contact email address for the branch.
    pub email: Option<String>,
    /// Whether the store may take part in new postings.
    pub status: AccountStatus,
}

/// Create the store table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_store_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS store (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                branch TEXT NOT NULL,
                address TEXT NOT NULL,
                phone TEXT,
                email TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new store in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateStoreCode] if a store with the same code already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_store(new: NewStore, connection: &Connection) -> Result<Store, Error> {
    connection
        .prepare(
            "INSERT INTO store (code, branch, address, phone, email, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, code, branch, address, phone, email, status, created_at",
        )?
        .query_row(
            (
                &new.code,
                &new.branch,
                &new.address,
                &new.phone,
                &new.email,
                new.status.as_str(),
                OffsetDateTime::now_utc(),
            ),
            map_store_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateStoreCode(new.code.clone()),
            error => error.into(),
        })
}

/// Retrieve a store from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid store,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_store(id: StoreId, connection: &Connection) -> Result<Store, Error> {
    let store = connection
        .prepare(
            "SELECT id, code, branch, address, phone, email, status, created_at
             FROM store WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_store_row)?;

    Ok(store)
}

/// Retrieve all stores, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_stores(connection: &Connection) -> Result<Vec<Store>, Error> {
    connection
        .prepare(
            "SELECT id, code, branch, address, phone, email, status, created_at
             FROM store ORDER BY created_at DESC, id DESC",
        )?
        .query_map([], map_store_row)?
        .map(|maybe_store| maybe_store.map_err(|error| error.into()))
        .collect()
}

/// Replace the named fields of the store with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingStore] if `id` does not refer to a valid store,
/// - [Error::DuplicateStoreCode] if the new code collides with another store,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_store(id: StoreId, new: NewStore, connection: &Connection) -> Result<Store, Error> {
    let rows_updated = connection
        .execute(
            "UPDATE store
             SET code = ?1, branch = ?2, address = ?3, phone = ?4, email = ?5, status = ?6
             WHERE id = ?7",
            (
                &new.code,
                &new.branch,
                &new.address,
                &new.phone,
                &new.email,
                new.status.as_str(),
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
            ) => Error::DuplicateStoreCode(new.code.clone()),
            error => error.into(),
        })?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingStore);
    }

    get_store(id, connection)
}

/// Delete the store with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingStore] if `id` does not refer to a valid store,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_store(id: StoreId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM store WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingStore);
    }

    Ok(())
}

/// Map a database row to a [Store].
pub(crate) fn map_store_row(row: &Row) -> Result<Store, rusqlite::Error> {
    let raw_status: String = row.get(6)?;
    let status = AccountStatus::parse(&raw_status).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("invalid store status {raw_status:?}").into(),
        )
    })?;

    Ok(Store {
        id: row.get(0)?,
        code: row.get(1)?,
        branch: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        status,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
pub(crate) fn test_store(code: &str) -> NewStore {
    NewStore {
        code: code.to_string(),
        branch: format!("{code} branch"),
        address: "1 Example Street".to_string(),
        phone: None,
        email: None,
        status: AccountStatus::Active,
    }
}
