use std::error::Error;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use tillbook::{
    PasswordHash,
    account_ref::{AccountRef, AccountStatus},
    balance::apply_delta,
    create_user,
    history::compute_snapshot,
    initialize_db,
    savings::{NewSavingsAccount, create_savings_account},
    store::{NewStore, create_store},
    transaction::{NewTransaction, TransactionKind, create_transaction},
    transfer::{TransferRequest, execute_transfer},
};

/// Create and populate a database for manual testing.
///
/// The seeded user logs in with test@example.com / "an insecure password".
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path for the new SQLite database.
    #[arg(long)]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    create_user(
        "test@example.com",
        // "an insecure password"
        PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        ),
        &conn,
    )?;

    let store = create_store(
        NewStore {
            code: "S-001".to_string(),
            branch: "Main Street".to_string(),
            address: "1 Main Street".to_string(),
            phone: Some("021 555 0123".to_string()),
            email: Some("mainstreet@example.com".to_string()),
            status: AccountStatus::Active,
        },
        &conn,
    )?;
    let savings = create_savings_account(
        NewSavingsAccount {
            code: "SAV-01".to_string(),
            name: "Operating reserve".to_string(),
            account_type: "savings".to_string(),
            bank_name: Some("Example Bank".to_string()),
            account_number: Some("12-3456-7890123-00".to_string()),
            status: AccountStatus::Active,
            notes: None,
        },
        &conn,
    )?;

    let today = OffsetDateTime::now_utc().date();
    let store_account = AccountRef::Store(store.id);
    let seed_postings = [
        (TransactionKind::Income, "sales", 850.0, "cash"),
        (TransactionKind::Income, "sales", 120.0, "card"),
        (TransactionKind::Expense, "supplies", 75.5, "cash"),
        (TransactionKind::Expense, "utilities", 42.0, "bank"),
    ];

    for (kind, category, amount, payment_method) in seed_postings {
        let record = create_transaction(
            NewTransaction {
                account: store_account,
                kind,
                category: category.to_string(),
                amount,
                payment_method: payment_method.to_string(),
                notes: None,
                transaction_date: today,
                staff_email: Some("test@example.com".to_string()),
            },
            &conn,
        )?;
        apply_delta(store_account, kind.signed_amount(record.amount), &conn)?;
    }

    execute_transfer(
        TransferRequest {
            from: store_account,
            to: AccountRef::Savings(savings.id),
            amount: 500.0,
            notes: Some("end of day banking".to_string()),
            staff_email: "test@example.com".to_string(),
        },
        today,
        &conn,
    )?;

    compute_snapshot(store_account, today, &conn)?;

    println!("Created test database at {}", args.db_path);

    Ok(())
}
