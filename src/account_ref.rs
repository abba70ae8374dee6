//! Typed references to the two kinds of funding source.
//!
//! A transaction or transfer always targets exactly one store or one savings
//! account. Modelling the target as an enum makes a reference with a
//! mismatched kind/id pair unrepresentable.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The database ID of a store.
pub type StoreId = i64;
/// The database ID of a savings account.
pub type SavingsAccountId = i64;

/// The lifecycle status shared by stores and savings accounts.
///
/// Only `active` accounts may take part in new transactions and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// The account is open for new postings.
    Active,
    /// The account is temporarily closed to new postings.
    Inactive,
    /// The account has been permanently closed.
    Stopped,
}

impl AccountStatus {
    /// The string stored in `status` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Stopped => "stopped",
        }
    }

    /// Parse the string stored in `status` columns.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "stopped" => Ok(AccountStatus::Stopped),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The discriminator naming which registry an [AccountRef] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// A store's cash-in-hand position.
    Store,
    /// A savings account position.
    Savings,
}

impl AccountKind {
    /// The string stored in `account_kind` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Store => "store",
            AccountKind::Savings => "savings",
        }
    }

    /// Parse the string stored in `account_kind` columns.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "store" => Ok(AccountKind::Store),
            "savings" => Ok(AccountKind::Savings),
            other => Err(Error::InvalidAccountKind(other.to_string())),
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reference to one funding source: a store or a savings account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "account_kind", content = "account_id", rename_all = "snake_case")]
pub enum AccountRef {
    /// A store, identified by its database ID.
    Store(StoreId),
    /// A savings account, identified by its database ID.
    Savings(SavingsAccountId),
}

impl AccountRef {
    /// Build a reference from a kind discriminator and an ID.
    pub fn new(kind: AccountKind, id: DatabaseId) -> Self {
        match kind {
            AccountKind::Store => AccountRef::Store(id),
            AccountKind::Savings => AccountRef::Savings(id),
        }
    }

    /// The kind discriminator for this reference.
    pub fn kind(&self) -> AccountKind {
        match self {
            AccountRef::Store(_) => AccountKind::Store,
            AccountRef::Savings(_) => AccountKind::Savings,
        }
    }

    /// The ID within the kind's registry.
    pub fn id(&self) -> DatabaseId {
        match self {
            AccountRef::Store(id) | AccountRef::Savings(id) => *id,
        }
    }

    /// A human-readable label for transfer notes, e.g. "Store".
    pub fn label(&self) -> &'static str {
        match self {
            AccountRef::Store(_) => "Store",
            AccountRef::Savings(_) => "Savings Account",
        }
    }

    /// Check that the referenced account exists and is active.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no row with this ID exists, or
    /// [Error::InactiveAccount] if the account's status is not `active`.
    pub fn require_active(&self, connection: &Connection) -> Result<(), Error> {
        let sql = match self {
            AccountRef::Store(_) => "SELECT status FROM store WHERE id = :id",
            AccountRef::Savings(_) => "SELECT status FROM savings_account WHERE id = :id",
        };

        let status: String = connection
            .prepare(sql)?
            .query_one(&[(":id", &self.id())], |row| row.get(0))?;

        if status != "active" {
            return Err(Error::InactiveAccount(*self));
        }

        Ok(())
    }
}

impl Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRef::Store(id) => write!(f, "store {id}"),
            AccountRef::Savings(id) => write!(f, "savings account {id}"),
        }
    }
}
