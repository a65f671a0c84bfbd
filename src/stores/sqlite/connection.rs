//! Implements a SQLite backed connection graph store.
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    db::CreateTable,
    models::AccountID,
    stores::{ConnectOutcome, ConnectionStore},
};

/// Stores the directed permission edges between accounts.
#[derive(Debug, Clone)]
pub struct SQLiteConnectionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteConnectionStore {
    /// Create a new connection graph store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ConnectionStore for SQLiteConnectionStore {
    /// Add a permission edge from `account` to `counterparty`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccountNotFound] if either account does not exist, or
    /// [Error::SqlError] if an SQL related error occurred.
    fn connect(
        &mut self,
        account: AccountID,
        counterparty: AccountID,
    ) -> Result<ConnectOutcome, Error> {
        let connection = self.connection.lock().unwrap();

        for id in [account, counterparty] {
            if !account_exists(&connection, id)? {
                tracing::warn!("cannot connect {account} to {counterparty}: {id} does not exist");
                return Err(Error::AccountNotFound);
            }
        }

        let rows_inserted = connection.execute(
            "INSERT OR IGNORE INTO connection (account_id, counterparty_id) VALUES (?1, ?2)",
            (account.as_i64(), counterparty.as_i64()),
        )?;

        if rows_inserted == 0 {
            tracing::warn!("account {account} is already connected to {counterparty}");
            Ok(ConnectOutcome::AlreadyExists)
        } else {
            tracing::info!("connected account {account} to {counterparty}");
            Ok(ConnectOutcome::Created)
        }
    }

    /// Whether the exact ordered edge `account` → `counterparty` is stored.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn is_authorized(&self, account: AccountID, counterparty: AccountID) -> Result<bool, Error> {
        let connection = self.connection.lock().unwrap();

        edge_exists(&connection, account, counterparty)
    }
}

impl CreateTable for SQLiteConnectionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS connection (
                    account_id INTEGER NOT NULL REFERENCES account(id),
                    counterparty_id INTEGER NOT NULL REFERENCES account(id),
                    PRIMARY KEY (account_id, counterparty_id)
                    )",
            (),
        )?;

        Ok(())
    }
}

/// Check for the ordered edge over an already held connection.
///
/// Used by the transfer engine so the check happens inside its transaction.
pub(crate) fn edge_exists(
    connection: &Connection,
    account: AccountID,
    counterparty: AccountID,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (
                SELECT 1 FROM connection WHERE account_id = ?1 AND counterparty_id = ?2
            )",
            (account.as_i64(), counterparty.as_i64()),
            |row| row.get(0),
        )
        .map_err(|e| e.into())
}

fn account_exists(connection: &Connection, id: AccountID) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM account WHERE id = ?1)",
            (id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|e| e.into())
}

#[cfg(test)]
mod connection_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        models::{AccountID, NewAccount, PasswordHash},
        stores::{AccountStore, ConnectOutcome, ConnectionStore, sqlite::SQLiteAccountStore},
    };

    use super::SQLiteConnectionStore;

    fn get_stores() -> (SQLiteConnectionStore, SQLiteAccountStore) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        (
            SQLiteConnectionStore::new(conn.clone()),
            SQLiteAccountStore::new(conn),
        )
    }

    fn create_account(store: &mut SQLiteAccountStore, email: &str) -> AccountID {
        store
            .create(NewAccount {
                username: email.to_string(),
                email: EmailAddress::from_str(email).unwrap(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            })
            .unwrap()
            .id
    }

    #[test]
    fn connect_creates_edge() {
        let (mut connections, mut accounts) = get_stores();
        let alice = create_account(&mut accounts, "alice@example.com");
        let bob = create_account(&mut accounts, "bob@example.com");

        let outcome = connections.connect(alice, bob).unwrap();

        assert_eq!(outcome, ConnectOutcome::Created);
        assert!(connections.is_authorized(alice, bob).unwrap());
    }

    #[test]
    fn connect_is_idempotent() {
        let (mut connections, mut accounts) = get_stores();
        let alice = create_account(&mut accounts, "alice@example.com");
        let bob = create_account(&mut accounts, "bob@example.com");

        assert_eq!(
            connections.connect(alice, bob).unwrap(),
            ConnectOutcome::Created
        );
        assert_eq!(
            connections.connect(alice, bob).unwrap(),
            ConnectOutcome::AlreadyExists
        );

        let edge_count: i64 = connections
            .connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM connection", [], |row| row.get(0))
            .unwrap();
        assert_eq!(edge_count, 1);
    }

    #[test]
    fn connect_fails_with_missing_counterparty() {
        let (mut connections, mut accounts) = get_stores();
        let alice = create_account(&mut accounts, "alice@example.com");

        let result = connections.connect(alice, AccountID::new(42));

        assert_eq!(result, Err(Error::AccountNotFound));
    }

    #[test]
    fn edges_are_directional() {
        let (mut connections, mut accounts) = get_stores();
        let alice = create_account(&mut accounts, "alice@example.com");
        let bob = create_account(&mut accounts, "bob@example.com");

        connections.connect(alice, bob).unwrap();

        assert!(connections.is_authorized(alice, bob).unwrap());
        assert!(!connections.is_authorized(bob, alice).unwrap());
    }

    #[test]
    fn is_authorized_returns_false_without_edge() {
        let (connections, mut accounts) = get_stores();
        let alice = create_account(&mut accounts, "alice@example.com");
        let bob = create_account(&mut accounts, "bob@example.com");

        assert!(!connections.is_authorized(alice, bob).unwrap());
    }
}
