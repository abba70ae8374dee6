//! The transfer workflow and its compensation rules.
//!
//! A transfer is four dependent writes with no database transaction spanning
//! them: two transaction-log legs, one transfer record linking the legs, and
//! two balance updates. Each leg-creation step that fails deletes whatever
//! earlier steps committed before the error is returned. The balance updates
//! are different: once the legs and the record are committed the transfer is
//! considered done, and a failed balance update is logged as ledger drift
//! rather than rolled back.

use rand::{Rng, distributions::Alphanumeric};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account_ref::{AccountKind, AccountRef, DatabaseId},
    balance::apply_delta,
    transaction::{
        NewTransaction, TransactionKind, TransactionRecord, create_transaction,
        delete_transaction, map_transaction_row_at,
    },
};

/// The category recorded on the outgoing leg of a transfer.
pub(crate) const CATEGORY_TRANSFER_OUT: &str = "transfer_out";
/// The category recorded on the incoming leg of a transfer.
pub(crate) const CATEGORY_TRANSFER_IN: &str = "transfer_in";
/// The payment method recorded on both legs of a transfer.
pub(crate) const PAYMENT_METHOD_TRANSFER: &str = "transfer";

/// A validated request to move money between two funding sources.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// The account the money leaves.
    pub from: AccountRef,
    /// The account the money arrives in.
    pub to: AccountRef,
    /// The positive amount to move.
    pub amount: f64,
    /// Free-form notes carried onto the legs and the record.
    pub notes: Option<String>,
    /// The email of the staff member running the transfer.
    pub staff_email: String,
}

/// The stored record linking the two legs of a committed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// The ID of the transfer in the application database.
    pub id: DatabaseId,
    /// The unique reference generated for this transfer.
    pub reference: String,
    /// The account the money left.
    pub from: AccountRef,
    /// The account the money arrived in.
    pub to: AccountRef,
    /// The amount moved.
    pub amount: f64,
    /// Free-form notes about the transfer.
    pub notes: Option<String>,
    /// The calendar day the transfer belongs to.
    pub transaction_date: Date,
    /// The email of the staff member who ran the transfer.
    pub staff_email: String,
    /// The ID of the outgoing transaction-log leg.
    pub outgoing_transaction_id: DatabaseId,
    /// The ID of the incoming transaction-log leg.
    pub incoming_transaction_id: DatabaseId,
    /// When the transfer was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Everything a committed transfer produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferOutcome {
    /// The unique reference generated for this transfer.
    pub reference: String,
    /// The outgoing transaction-log leg.
    pub outgoing_transaction: TransactionRecord,
    /// The incoming transaction-log leg.
    pub incoming_transaction: TransactionRecord,
    /// The stored record linking the legs.
    pub transfer_record: TransferRecord,
}

/// A transfer record expanded with both of its legs, as served by the list
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferWithLegs {
    /// The stored transfer record.
    #[serde(flatten)]
    pub record: TransferRecord,
    /// The outgoing transaction-log leg.
    pub outgoing_transaction: TransactionRecord,
    /// The incoming transaction-log leg.
    pub incoming_transaction: TransactionRecord,
}

/// Create the transfer table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reference TEXT NOT NULL UNIQUE,
                from_kind TEXT NOT NULL,
                from_id INTEGER NOT NULL,
                to_kind TEXT NOT NULL,
                to_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                notes TEXT,
                transaction_date TEXT NOT NULL,
                staff_email TEXT NOT NULL,
                outgoing_transaction_id INTEGER NOT NULL REFERENCES transactions(id),
                incoming_transaction_id INTEGER NOT NULL REFERENCES transactions(id),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Move money between two funding sources.
///
/// The steps run in order: post the outgoing leg, post the incoming leg,
/// create the transfer record, then update both balances. A failure posting
/// the incoming leg deletes the outgoing leg; a failure creating the record
/// deletes both legs. In either case nothing from the attempt remains. A
/// failure updating balances does NOT undo the committed legs and record:
/// the transfer still succeeds and the drift is logged for manual
/// reconciliation.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::SameAccountTransfer] if both sides name the same account,
/// - [Error::MissingField] if the staff email is empty,
/// - [Error::NotFound] or [Error::InactiveAccount] if either account cannot
///   take part,
/// - [Error::TransferOutgoingFailed], [Error::TransferIncomingFailed], or
///   [Error::TransferRecordFailed] if the corresponding step failed.
pub fn execute_transfer(
    request: TransferRequest,
    transaction_date: Date,
    connection: &Connection,
) -> Result<TransferOutcome, Error> {
    if request.amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    if request.from == request.to {
        return Err(Error::SameAccountTransfer);
    }

    if request.staff_email.is_empty() {
        return Err(Error::MissingField("staff_email"));
    }

    request.from.require_active(connection)?;
    request.to.require_active(connection)?;

    let reference = generate_reference();
    let notes = request.notes.as_deref().unwrap_or_default();

    // Step 1: post the outgoing leg. Nothing to compensate on failure.
    let outgoing = create_transaction(
        NewTransaction {
            account: request.from,
            kind: TransactionKind::Expense,
            category: CATEGORY_TRANSFER_OUT.to_string(),
            amount: request.amount,
            payment_method: PAYMENT_METHOD_TRANSFER.to_string(),
            notes: Some(format!("Transfer out to {}: {notes}", request.to.label())),
            transaction_date,
            staff_email: Some(request.staff_email.clone()),
        },
        connection,
    )
    .map_err(|error| Error::TransferOutgoingFailed(error.to_string()))?;

    // Step 2: post the incoming leg. On failure the outgoing leg must go.
    let incoming = match create_transaction(
        NewTransaction {
            account: request.to,
            kind: TransactionKind::Income,
            category: CATEGORY_TRANSFER_IN.to_string(),
            amount: request.amount,
            payment_method: PAYMENT_METHOD_TRANSFER.to_string(),
            notes: Some(format!(
                "Transfer in from {}: {notes}",
                request.from.label()
            )),
            transaction_date,
            staff_email: Some(request.staff_email.clone()),
        },
        connection,
    ) {
        Ok(incoming) => incoming,
        Err(error) => {
            compensate(&reference, &[outgoing.id], connection);
            return Err(Error::TransferIncomingFailed(error.to_string()));
        }
    };

    // Step 3: link the legs. On failure both legs must go.
    let transfer_record = match insert_transfer_record(
        &reference,
        &request,
        transaction_date,
        outgoing.id,
        incoming.id,
        connection,
    ) {
        Ok(record) => record,
        Err(error) => {
            compensate(&reference, &[outgoing.id, incoming.id], connection);
            return Err(Error::TransferRecordFailed(error.to_string()));
        }
    };

    // Step 4: update both balances. The legs and the record are already
    // committed, so failures here leave drift instead of rolling back.
    if let Err(error) = apply_delta(request.from, -request.amount, connection) {
        log_drift(&reference, request.from, error);
    }
    if let Err(error) = apply_delta(request.to, request.amount, connection) {
        log_drift(&reference, request.to, error);
    }

    Ok(TransferOutcome {
        reference,
        outgoing_transaction: outgoing,
        incoming_transaction: incoming,
        transfer_record,
    })
}

/// Retrieve all transfers with their legs expanded, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transfers(connection: &Connection) -> Result<Vec<TransferWithLegs>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.reference, t.from_kind, t.from_id, t.to_kind, t.to_id, t.amount,
                    t.notes, t.transaction_date, t.staff_email, t.outgoing_transaction_id,
                    t.incoming_transaction_id, t.created_at,
                    o.id, o.account_kind, o.account_id, o.kind, o.category, o.amount,
                    o.payment_method, o.notes, o.transaction_date, o.staff_email, o.created_at,
                    i.id, i.account_kind, i.account_id, i.kind, i.category, i.amount,
                    i.payment_method, i.notes, i.transaction_date, i.staff_email, i.created_at
             FROM transfers t
             INNER JOIN transactions o ON o.id = t.outgoing_transaction_id
             INNER JOIN transactions i ON i.id = t.incoming_transaction_id
             ORDER BY t.created_at DESC, t.id DESC",
        )?
        .query_map([], |row| {
            Ok(TransferWithLegs {
                record: map_transfer_row(row)?,
                outgoing_transaction: map_transaction_row_at(row, 13)?,
                incoming_transaction: map_transaction_row_at(row, 24)?,
            })
        })?
        .map(|maybe_transfer| maybe_transfer.map_err(|error| error.into()))
        .collect()
}

/// A reference like `TRF-1704412800000-k3v9pq21x`: the current unix
/// timestamp in milliseconds plus a random base-36 suffix.
fn generate_reference() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .take(9)
        .collect();

    format!("TRF-{millis}-{suffix}")
}

fn insert_transfer_record(
    reference: &str,
    request: &TransferRequest,
    transaction_date: Date,
    outgoing_transaction_id: DatabaseId,
    incoming_transaction_id: DatabaseId,
    connection: &Connection,
) -> Result<TransferRecord, Error> {
    let record = connection
        .prepare(
            "INSERT INTO transfers
                (reference, from_kind, from_id, to_kind, to_id, amount, notes, transaction_date,
                 staff_email, outgoing_transaction_id, incoming_transaction_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             RETURNING id, reference, from_kind, from_id, to_kind, to_id, amount, notes,
                transaction_date, staff_email, outgoing_transaction_id, incoming_transaction_id,
                created_at",
        )?
        .query_row(
            (
                reference,
                request.from.kind().as_str(),
                request.from.id(),
                request.to.kind().as_str(),
                request.to.id(),
                request.amount,
                &request.notes,
                transaction_date,
                &request.staff_email,
                outgoing_transaction_id,
                incoming_transaction_id,
                OffsetDateTime::now_utc(),
            ),
            map_transfer_row,
        )?;

    Ok(record)
}

/// Delete the legs a failed transfer attempt already committed.
///
/// Compensation itself running into an error leaves orphaned legs behind;
/// that is logged loudly since it needs an operator to clean up.
fn compensate(reference: &str, transaction_ids: &[DatabaseId], connection: &Connection) {
    for &transaction_id in transaction_ids {
        if let Err(error) = delete_transaction(transaction_id, connection) {
            tracing::error!(
                "Compensation for transfer {reference} could not delete transaction \
                 {transaction_id}: {error}. The orphaned leg must be removed manually.",
            );
        }
    }
}

fn log_drift(reference: &str, account: AccountRef, error: Error) {
    tracing::error!(
        "Failed to update the balance for {account} after transfer {reference}: {error}. \
         The stored balance lags the transaction log until it is reconciled.",
    );
}

/// Map a database row to a [TransferRecord].
pub(crate) fn map_transfer_row(row: &Row) -> Result<TransferRecord, rusqlite::Error> {
    let parse_kind = |index: usize, raw: String| {
        AccountKind::parse(&raw).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                format!("invalid account kind {raw:?}").into(),
            )
        })
    };

    let from_kind = parse_kind(2, row.get(2)?)?;
    let to_kind = parse_kind(4, row.get(4)?)?;

    Ok(TransferRecord {
        id: row.get(0)?,
        reference: row.get(1)?,
        from: AccountRef::new(from_kind, row.get(3)?),
        to: AccountRef::new(to_kind, row.get(5)?),
        amount: row.get(6)?,
        notes: row.get(7)?,
        transaction_date: row.get(8)?,
        staff_email: row.get(9)?,
        outgoing_transaction_id: row.get(10)?,
        incoming_transaction_id: row.get(11)?,
        created_at: row.get(12)?,
    })
}
