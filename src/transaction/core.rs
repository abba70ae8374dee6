//! Defines the core data model and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account_ref::{AccountKind, AccountRef, DatabaseId},
};

// ============================================================================
// MODELS
// ============================================================================

/// How a posting moves its account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money coming in. Adds to the balance.
    Income,
    /// Money going out. Subtracts from the balance.
    Expense,
    /// Money moved elsewhere. Subtracts from the balance.
    Transfer,
}

impl TransactionKind {
    /// The string stored in `kind` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Transfer => "transfer",
        }
    }

    /// Parse the string stored in `kind` columns.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(Error::InvalidTransactionKind(other.to_string())),
        }
    }

    /// Apply the kind's sign convention to a positive posting amount.
    pub fn signed_amount(&self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense | TransactionKind::Transfer => -amount,
        }
    }
}

/// One posting in the transaction log.
///
/// Postings are immutable once created. The only delete path is the
/// compensation step of the transfer workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The account the posting moves.
    #[serde(flatten)]
    pub account: AccountRef,
    /// How the posting moves the balance.
    pub kind: TransactionKind,
    /// The business category, e.g. "sales" or "transfer_out".
    pub category: String,
    /// The positive amount of money moved.
    pub amount: f64,
    /// How the money moved, e.g. "cash".
    pub payment_method: String,
    /// Free-form notes about the posting.
    pub notes: Option<String>,
    /// The calendar day the posting belongs to.
    pub transaction_date: Date,
    /// The email of the staff member who recorded the posting.
    pub staff_email: Option<String>,
    /// When the posting was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a posting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The account the posting moves.
    pub account: AccountRef,
    /// How the posting moves the balance.
    pub kind: TransactionKind,
    /// The business category.
    pub category: String,
    /// The positive amount of money moved.
    pub amount: f64,
    /// How the money moved.
    pub payment_method: String,
    /// Free-form notes about the posting.
    pub notes: Option<String>,
    /// The calendar day the posting belongs to.
    pub transaction_date: Date,
    /// The email of the staff member recording the posting.
    pub staff_email: Option<String>,
}

/// The per-kind amount sums for one account on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayTotals {
    /// The sum of income posting amounts.
    pub income: f64,
    /// The sum of expense posting amounts.
    pub expense: f64,
    /// The sum of transfer posting amounts.
    pub transfer: f64,
}

impl DayTotals {
    /// The day's net movement: income less expenses and transfers.
    pub fn net_change(&self) -> f64 {
        self.income - self.expense - self.transfer
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_kind TEXT NOT NULL,
                account_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                payment_method TEXT NOT NULL,
                notes TEXT,
                transaction_date TEXT NOT NULL,
                staff_email TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Composite index used by the daily snapshot computation.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account_date
         ON transactions(account_kind, account_id, transaction_date);",
        (),
    )?;

    Ok(())
}

/// Create a new posting in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new: NewTransaction,
    connection: &Connection,
) -> Result<TransactionRecord, Error> {
    if new.amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    let record = connection
        .prepare(
            "INSERT INTO transactions
                (account_kind, account_id, kind, category, amount, payment_method, notes,
                 transaction_date, staff_email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING id, account_kind, account_id, kind, category, amount, payment_method,
                notes, transaction_date, staff_email, created_at",
        )?
        .query_row(
            (
                new.account.kind().as_str(),
                new.account.id(),
                new.kind.as_str(),
                &new.category,
                new.amount,
                &new.payment_method,
                &new.notes,
                new.transaction_date,
                &new.staff_email,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(record)
}

/// Retrieve a posting from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid posting,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: DatabaseId, connection: &Connection) -> Result<TransactionRecord, Error> {
    let record = connection
        .prepare(
            "SELECT id, account_kind, account_id, kind, category, amount, payment_method, notes,
                transaction_date, staff_email, created_at
             FROM transactions WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(record)
}

/// Delete the posting with `id`.
///
/// This is the transfer workflow's compensation primitive; nothing else
/// removes rows from the transaction log.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid posting,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM transactions WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve postings, newest first, optionally restricted to one account.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    account: Option<AccountRef>,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<TransactionRecord>, Error> {
    match account {
        Some(account) => connection
            .prepare(
                "SELECT id, account_kind, account_id, kind, category, amount, payment_method,
                    notes, transaction_date, staff_email, created_at
                 FROM transactions
                 WHERE account_kind = ?1 AND account_id = ?2
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?3 OFFSET ?4",
            )?
            .query_map(
                (
                    account.kind().as_str(),
                    account.id(),
                    limit as i64,
                    offset as i64,
                ),
                map_transaction_row,
            )?
            .map(|maybe_record| maybe_record.map_err(|error| error.into()))
            .collect(),
        None => connection
            .prepare(
                "SELECT id, account_kind, account_id, kind, category, amount, payment_method,
                    notes, transaction_date, staff_email, created_at
                 FROM transactions
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2",
            )?
            .query_map((limit as i64, offset as i64), map_transaction_row)?
            .map(|maybe_record| maybe_record.map_err(|error| error.into()))
            .collect(),
    }
}

/// Get the total number of postings in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transactions;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Sum the day's posting amounts for `account`, grouped by kind.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn day_totals(
    account: AccountRef,
    date: Date,
    connection: &Connection,
) -> Result<DayTotals, Error> {
    let mut statement = connection.prepare(
        "SELECT kind, COALESCE(SUM(amount), 0)
         FROM transactions
         WHERE account_kind = ?1 AND account_id = ?2 AND transaction_date = ?3
         GROUP BY kind",
    )?;
    let mut rows = statement.query((account.kind().as_str(), account.id(), date))?;

    let mut totals = DayTotals::default();
    while let Some(row) = rows.next()? {
        let raw_kind: String = row.get(0)?;
        let total: f64 = row.get(1)?;

        match TransactionKind::parse(&raw_kind)? {
            TransactionKind::Income => totals.income = total,
            TransactionKind::Expense => totals.expense = total,
            TransactionKind::Transfer => totals.transfer = total,
        }
    }

    Ok(totals)
}

/// Map a database row to a [TransactionRecord].
pub(crate) fn map_transaction_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    map_transaction_row_at(row, 0)
}

/// Map a database row to a [TransactionRecord], reading columns starting at
/// `offset`.
///
/// Useful when transactions are joined onto another table and two records
/// need to be built from the one row.
pub(crate) fn map_transaction_row_at(
    row: &Row,
    offset: usize,
) -> Result<TransactionRecord, rusqlite::Error> {
    let raw_account_kind: String = row.get(offset + 1)?;
    let account_kind = AccountKind::parse(&raw_account_kind).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 1,
            rusqlite::types::Type::Text,
            format!("invalid account kind {raw_account_kind:?}").into(),
        )
    })?;

    let raw_kind: String = row.get(offset + 3)?;
    let kind = TransactionKind::parse(&raw_kind).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 3,
            rusqlite::types::Type::Text,
            format!("invalid transaction kind {raw_kind:?}").into(),
        )
    })?;

    Ok(TransactionRecord {
        id: row.get(offset)?,
        account: AccountRef::new(account_kind, row.get(offset + 2)?),
        kind,
        category: row.get(offset + 4)?,
        amount: row.get(offset + 5)?,
        payment_method: row.get(offset + 6)?,
        notes: row.get(offset + 7)?,
        transaction_date: row.get(offset + 8)?,
        staff_email: row.get(offset + 9)?,
        created_at: row.get(offset + 10)?,
    })
}

#[cfg(test)]
pub(crate) fn test_posting(
    account: AccountRef,
    kind: TransactionKind,
    amount: f64,
    date: Date,
) -> NewTransaction {
    NewTransaction {
        account,
        kind,
        category: "sales".to_string(),
        amount,
        payment_method: "cash".to_string(),
        notes: None,
        transaction_date: date,
        staff_email: Some("staff@example.com".to_string()),
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod day_totals_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{account_ref::AccountRef, db::initialize, transaction::TransactionKind};

    use super::{create_transaction, day_totals, test_posting};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn sums_amounts_by_kind() {
        let conn = get_test_connection();
        let account = AccountRef::Store(1);
        let day = date!(2024 - 01 - 05);
        create_transaction(
            test_posting(account, TransactionKind::Income, 500.0, day),
            &conn,
        )
        .unwrap();
        create_transaction(
            test_posting(account, TransactionKind::Expense, 120.0, day),
            &conn,
        )
        .unwrap();
        create_transaction(
            test_posting(account, TransactionKind::Transfer, 50.0, day),
            &conn,
        )
        .unwrap();

        let totals = day_totals(account, day, &conn).unwrap();

        assert_eq!(totals.income, 500.0);
        assert_eq!(totals.expense, 120.0);
        assert_eq!(totals.transfer, 50.0);
        assert_eq!(totals.net_change(), 330.0);
    }

    #[test]
    fn ignores_other_days_and_accounts() {
        let conn = get_test_connection();
        let account = AccountRef::Store(1);
        let day = date!(2024 - 01 - 05);
        create_transaction(
            test_posting(account, TransactionKind::Income, 500.0, day),
            &conn,
        )
        .unwrap();
        create_transaction(
            test_posting(account, TransactionKind::Income, 77.0, date!(2024 - 01 - 06)),
            &conn,
        )
        .unwrap();
        create_transaction(
            test_posting(AccountRef::Store(2), TransactionKind::Income, 99.0, day),
            &conn,
        )
        .unwrap();

        let totals = day_totals(account, day, &conn).unwrap();

        assert_eq!(totals.income, 500.0);
        assert_eq!(totals.expense, 0.0);
        assert_eq!(totals.transfer, 0.0);
    }

    #[test]
    fn empty_day_totals_are_zero() {
        let conn = get_test_connection();

        let totals = day_totals(AccountRef::Store(1), date!(2024 - 01 - 05), &conn).unwrap();

        assert_eq!(totals, super::DayTotals::default());
    }
}
