//! Computes and stores one account's opening/closing balances and totals for
//! a calendar day.
//!
//! A snapshot is derived entirely from the day's transaction log plus the
//! previous day's stored closing balance. Recomputing a day replaces its row,
//! so running the computation any number of times gives the same result.
//! Recomputing an earlier day does NOT cascade into later days: a later day
//! keeps its stored opening balance until its own recompute is triggered.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account_ref::{AccountKind, AccountRef, DatabaseId},
    balance::get_balance,
    transaction::day_totals,
};

/// One account's cash position and movement totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyHistoryRecord {
    /// The ID of the record in the application database.
    pub id: DatabaseId,
    /// The account the snapshot describes.
    #[serde(flatten)]
    pub account: AccountRef,
    /// The calendar day the snapshot describes.
    pub date: Date,
    /// The previous day's closing balance, or 0 with no prior snapshot.
    pub opening_balance: f64,
    /// `opening_balance + net_change`.
    pub closing_balance: f64,
    /// The day's summed income posting amounts.
    pub total_income: f64,
    /// The day's summed expense posting amounts.
    pub total_expense: f64,
    /// The day's summed transfer posting amounts.
    pub total_transfer: f64,
    /// `total_income - total_expense - total_transfer`.
    pub net_change: f64,
}

/// Create the cash history table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS cash_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_kind TEXT NOT NULL,
                account_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                opening_balance REAL NOT NULL,
                closing_balance REAL NOT NULL,
                total_income REAL NOT NULL,
                total_expense REAL NOT NULL,
                total_transfer REAL NOT NULL,
                net_change REAL NOT NULL,
                UNIQUE(account_kind, account_id, date)
                )",
        (),
    )?;

    Ok(())
}

/// Compute and store the snapshot for `account` on `date`.
///
/// The account must already have a balance entry; an account that has never
/// seen a movement has nothing to snapshot. The stored row is keyed by
/// (account, date), so recomputation overwrites the prior totals instead of
/// accumulating them.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account has no balance entry,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn compute_snapshot(
    account: AccountRef,
    date: Date,
    connection: &Connection,
) -> Result<DailyHistoryRecord, Error> {
    // The reference behavior reads the balance entry purely as an existence
    // check before computing anything.
    get_balance(account, connection)?;

    let opening_balance = match date.previous_day() {
        Some(previous_day) => {
            get_closing_balance(account, previous_day, connection)?.unwrap_or(0.0)
        }
        None => 0.0,
    };

    let totals = day_totals(account, date, connection)?;
    let net_change = totals.net_change();
    let closing_balance = opening_balance + net_change;

    let record = connection
        .prepare(
            "INSERT INTO cash_history
                (account_kind, account_id, date, opening_balance, closing_balance, total_income,
                 total_expense, total_transfer, net_change)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (account_kind, account_id, date) DO UPDATE SET
                opening_balance = excluded.opening_balance,
                closing_balance = excluded.closing_balance,
                total_income = excluded.total_income,
                total_expense = excluded.total_expense,
                total_transfer = excluded.total_transfer,
                net_change = excluded.net_change
             RETURNING id, account_kind, account_id, date, opening_balance, closing_balance,
                total_income, total_expense, total_transfer, net_change",
        )?
        .query_row(
            (
                account.kind().as_str(),
                account.id(),
                date,
                opening_balance,
                closing_balance,
                totals.income,
                totals.expense,
                totals.transfer,
                net_change,
            ),
            map_history_row,
        )?;

    Ok(record)
}

/// Retrieve snapshots, newest day first, optionally filtered by account
/// and/or date.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_history(
    account: Option<AccountRef>,
    date: Option<Date>,
    connection: &Connection,
) -> Result<Vec<DailyHistoryRecord>, Error> {
    let mut sql = String::from(
        "SELECT id, account_kind, account_id, date, opening_balance, closing_balance,
            total_income, total_expense, total_transfer, net_change
         FROM cash_history",
    );
    let mut clauses = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(account) = account {
        clauses.push(format!("account_kind = ?{}", params.len() + 1));
        params.push(Box::new(account.kind().as_str()));
        clauses.push(format!("account_id = ?{}", params.len() + 1));
        params.push(Box::new(account.id()));
    }

    if let Some(date) = date {
        clauses.push(format!("date = ?{}", params.len() + 1));
        params.push(Box::new(date));
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    sql.push_str(" ORDER BY date DESC, account_kind DESC, account_id");

    connection
        .prepare(&sql)?
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|param| param.as_ref())),
            map_history_row,
        )?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Look up the stored closing balance for `account` on `date`.
fn get_closing_balance(
    account: AccountRef,
    date: Date,
    connection: &Connection,
) -> Result<Option<f64>, Error> {
    let result = connection
        .prepare(
            "SELECT closing_balance FROM cash_history
             WHERE account_kind = ?1 AND account_id = ?2 AND date = ?3",
        )?
        .query_one((account.kind().as_str(), account.id(), date), |row| {
            row.get(0)
        });

    match result {
        Ok(closing_balance) => Ok(Some(closing_balance)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Map a database row to a [DailyHistoryRecord].
pub(crate) fn map_history_row(row: &Row) -> Result<DailyHistoryRecord, rusqlite::Error> {
    let raw_kind: String = row.get(1)?;
    let kind = AccountKind::parse(&raw_kind).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("invalid account kind {raw_kind:?}").into(),
        )
    })?;

    Ok(DailyHistoryRecord {
        id: row.get(0)?,
        account: AccountRef::new(kind, row.get(2)?),
        date: row.get(3)?,
        opening_balance: row.get(4)?,
        closing_balance: row.get(5)?,
        total_income: row.get(6)?,
        total_expense: row.get(7)?,
        total_transfer: row.get(8)?,
        net_change: row.get(9)?,
    })
}


#[cfg(test)]
mod list_history_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account_ref::AccountRef,
        balance::apply_delta,
        db::initialize,
    };

    use super::{compute_snapshot, list_history};

    #[test]
    fn filters_by_account_and_date() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        apply_delta(AccountRef::Store(1), 10.0, &conn).unwrap();
        apply_delta(AccountRef::Store(2), 10.0, &conn).unwrap();
        let day = date!(2024 - 01 - 05);
        compute_snapshot(AccountRef::Store(1), day, &conn).unwrap();
        compute_snapshot(AccountRef::Store(2), day, &conn).unwrap();
        compute_snapshot(AccountRef::Store(1), date!(2024 - 01 - 06), &conn).unwrap();

        let all = list_history(None, None, &conn).unwrap();
        let for_account = list_history(Some(AccountRef::Store(1)), None, &conn).unwrap();
        let for_day = list_history(None, Some(day), &conn).unwrap();
        let for_both = list_history(Some(AccountRef::Store(1)), Some(day), &conn).unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(for_account.len(), 2);
        assert_eq!(for_day.len(), 2);
        assert_eq!(for_both.len(), 1);
    }

    #[test]
    fn newest_day_comes_first() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        apply_delta(AccountRef::Store(1), 10.0, &conn).unwrap();
        compute_snapshot(AccountRef::Store(1), date!(2024 - 01 - 05), &conn).unwrap();
        compute_snapshot(AccountRef::Store(1), date!(2024 - 01 - 07), &conn).unwrap();

        let records = list_history(None, None, &conn).unwrap();

        assert_eq!(records[0].date, date!(2024 - 01 - 07));
        assert_eq!(records[1].date, date!(2024 - 01 - 05));
    }
}
