//! A utility for creating a seeded database for manual testing of paybuddy.

use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use paybuddy::{
    Registrar, TransferService, initialize_db,
    models::PasswordHash,
    stores::{
        ConnectionStore,
        sqlite::{SQLiteAccountStore, SQLiteConnectionStore},
    },
};

/// A utility for creating a seeded demo database for paybuddy.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
///
/// Seeds two demo accounts, connects them one way, and records one transfer
/// so the history page has something to show.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    let connection = Arc::new(Mutex::new(connection));

    println!("Creating demo accounts...");

    let mut registrar = Registrar::new(
        SQLiteAccountStore::new(connection.clone()),
        PasswordHash::DEFAULT_COST,
    );

    let alice = registrar.register(
        "Alice",
        EmailAddress::from_str("alice@example.com")?,
        "alluvial-parsnip-gearbox-91",
    )?;
    let bob = registrar.register(
        "Bob",
        EmailAddress::from_str("bob@example.com")?,
        "ferrous-lantern-oboe-decade-38",
    )?;

    let mut connections = SQLiteConnectionStore::new(connection.clone());
    connections.connect(alice.id, bob.id)?;

    println!("Recording demo transfer...");

    let transfers = TransferService::new(connection);
    transfers.transfer(alice.id, bob.id, Decimal::from_str("25.00")?, "lunch")?;

    println!("Success!");

    Ok(())
}
