/*! Creates the application's database schema. */

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, balance::create_balance_table, history::create_history_table,
    savings::create_savings_account_table, store::create_store_table,
    transaction::create_transaction_table, transfer::create_transfer_table,
    user::create_user_table,
};

/// Create the tables for the domain models.
///
/// Table creation runs in a single exclusive transaction so a partially
/// created schema is never left behind.
///
/// # Errors
/// Returns an [Error::SqlError] if any table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_store_table(&transaction)?;
    create_savings_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transfer_table(&transaction)?;
    create_balance_table(&transaction)?;
    create_history_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn schema_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(Ok(()), initialize(&connection));
    }
}
