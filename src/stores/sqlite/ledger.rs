//! Implements a SQLite backed ledger store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{AccountID, DatabaseID, LedgerEntry, NewLedgerEntry},
    stores::LedgerStore,
};

/// Read access to the [LedgerEntry] records.
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new ledger store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl LedgerStore for SQLiteLedgerStore {
    /// Get the ledger entry with the specified `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccountNotFound] if there is no entry with the given
    /// ID, or [Error::SqlError] if there are SQL related errors.
    fn get(&self, id: DatabaseID) -> Result<LedgerEntry, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, sender_id, receiver_id, amount, description, created_at
                 FROM ledger_entry WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], SQLiteLedgerStore::map_row)
            .map_err(|e| e.into())
    }

    /// Every ledger entry where `account` is sender or receiver, most recent
    /// first.
    ///
    /// Rows are fetched in insertion order and then stably sorted by
    /// timestamp, so entries sharing a timestamp keep their insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if there are SQL related errors.
    fn history_for(&self, account: AccountID) -> Result<Vec<LedgerEntry>, Error> {
        tracing::info!("fetching transaction history for account {account}");

        let mut entries: Vec<LedgerEntry> = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, sender_id, receiver_id, amount, description, created_at
                 FROM ledger_entry
                 WHERE sender_id = :id OR receiver_id = :id
                 ORDER BY id ASC",
            )?
            .query_map(&[(":id", &account.as_i64())], SQLiteLedgerStore::map_row)?
            .map(|maybe_entry| maybe_entry.map_err(Error::from))
            .collect::<Result<_, _>>()?;

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(entries)
    }
}

impl CreateTable for SQLiteLedgerStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS ledger_entry (
                    id INTEGER PRIMARY KEY,
                    sender_id INTEGER NOT NULL REFERENCES account(id),
                    receiver_id INTEGER NOT NULL REFERENCES account(id),
                    amount TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL
                    )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_ledger_entry_sender ON ledger_entry (sender_id)",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_ledger_entry_receiver ON ledger_entry (receiver_id)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteLedgerStore {
    type ReturnType = LedgerEntry;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let sender = AccountID::new(row.get(offset + 1)?);
        let receiver = AccountID::new(row.get(offset + 2)?);

        let raw_amount: String = row.get(offset + 3)?;
        let amount = Decimal::from_str_exact(&raw_amount).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 3,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        let description = row.get(offset + 4)?;
        let created_at = row.get(offset + 5)?;

        Ok(LedgerEntry {
            id,
            sender,
            receiver,
            amount,
            description,
            created_at,
        })
    }
}

/// Append an entry to the ledger over an already held connection.
///
/// Used by the transfer engine so the append happens inside the same
/// transaction as the balance updates. The entry ID comes from the database;
/// `created_at` is the commit timestamp assigned by the engine.
pub(crate) fn insert_entry(
    connection: &Connection,
    new_entry: NewLedgerEntry,
    created_at: OffsetDateTime,
) -> Result<LedgerEntry, Error> {
    connection.execute(
        "INSERT INTO ledger_entry (sender_id, receiver_id, amount, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_entry.sender.as_i64(),
            new_entry.receiver.as_i64(),
            new_entry.amount.to_string(),
            &new_entry.description,
            created_at,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(LedgerEntry {
        id,
        sender: new_entry.sender,
        receiver: new_entry.receiver,
        amount: new_entry.amount,
        description: new_entry.description,
        created_at,
    })
}

#[cfg(test)]
mod ledger_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        db::initialize,
        models::{AccountID, NewAccount, NewLedgerEntry, PasswordHash},
        stores::{AccountStore, LedgerStore, sqlite::SQLiteAccountStore},
    };

    use super::{SQLiteLedgerStore, insert_entry};

    fn get_store_with_accounts() -> (SQLiteLedgerStore, AccountID, AccountID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let mut accounts = SQLiteAccountStore::new(conn.clone());
        let alice = create_account(&mut accounts, "alice@example.com");
        let bob = create_account(&mut accounts, "bob@example.com");

        (SQLiteLedgerStore::new(conn), alice, bob)
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

    fn record_transfer(
        store: &SQLiteLedgerStore,
        sender: AccountID,
        receiver: AccountID,
        description: &str,
        created_at: OffsetDateTime,
    ) -> crate::models::LedgerEntry {
        let connection = store.connection.lock().unwrap();

        insert_entry(
            &connection,
            NewLedgerEntry {
                sender,
                receiver,
                amount: Decimal::new(10_00, 2),
                description: description.to_string(),
            },
            created_at,
        )
        .unwrap()
    }

    #[test]
    fn insert_and_get_round_trips() {
        let (store, alice, bob) = get_store_with_accounts();

        let inserted = record_transfer(&store, alice, bob, "rent", datetime!(2026-01-05 12:00 UTC));

        let retrieved = store.get(inserted.id).unwrap();

        assert_eq!(retrieved, inserted);
    }

    #[test]
    fn get_fails_with_non_existent_id() {
        let (store, _alice, _bob) = get_store_with_accounts();

        assert_eq!(store.get(42), Err(Error::AccountNotFound));
    }

    #[test]
    fn history_is_empty_for_account_without_transfers() {
        let (store, alice, _bob) = get_store_with_accounts();

        assert_eq!(store.history_for(alice).unwrap(), vec![]);
    }

    #[test]
    fn history_returns_most_recent_first() {
        let (store, alice, bob) = get_store_with_accounts();

        let older = record_transfer(&store, alice, bob, "T1", datetime!(2026-01-05 12:00 UTC));
        let newer = record_transfer(&store, alice, bob, "T2", datetime!(2026-01-06 12:00 UTC));

        let history = store.history_for(alice).unwrap();

        assert_eq!(history, vec![newer, older]);
    }

    #[test]
    fn history_breaks_timestamp_ties_by_insertion_order() {
        let (store, alice, bob) = get_store_with_accounts();

        let timestamp = datetime!(2026-01-05 12:00 UTC);
        let first = record_transfer(&store, alice, bob, "first", timestamp);
        let second = record_transfer(&store, bob, alice, "second", timestamp);

        let history = store.history_for(alice).unwrap();

        assert_eq!(history, vec![first, second]);
    }

    #[test]
    fn history_includes_sent_and_received_only() {
        let (store, alice, bob) = get_store_with_accounts();
        let mut accounts = SQLiteAccountStore::new(store.connection.clone());
        let carol = create_account(&mut accounts, "carol@example.com");

        let sent = record_transfer(&store, alice, bob, "sent", datetime!(2026-01-05 12:00 UTC));
        let received = record_transfer(&store, bob, alice, "received", datetime!(2026-01-06 12:00 UTC));
        // A transfer between two other accounts must not show up.
        record_transfer(&store, bob, carol, "unrelated", datetime!(2026-01-07 12:00 UTC));

        let history = store.history_for(alice).unwrap();

        assert_eq!(history, vec![received, sent]);
    }
}
