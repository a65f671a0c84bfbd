//! Implements a SQLite backed account store.
use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Account, AccountID, NewAccount, PasswordHash, STARTING_BALANCE},
    stores::AccountStore,
};

/// Handles the creation and retrieval of [Account] objects.
#[derive(Debug, Clone)]
pub struct SQLiteAccountStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteAccountStore {
    /// Create a new account store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl AccountStore for SQLiteAccountStore {
    /// Create and insert a new account into the database.
    ///
    /// The account's balance is set to [STARTING_BALANCE].
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email address is taken, or
    /// [Error::SqlError] if an SQL related error occurred.
    fn create(&mut self, new_account: NewAccount) -> Result<Account, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO account (username, email, password, balance) VALUES (?1, ?2, ?3, ?4)",
            (
                &new_account.username,
                &new_account.email.to_string(),
                new_account.password_hash.to_string(),
                STARTING_BALANCE.to_string(),
            ),
        )?;

        let id = AccountID::new(connection.last_insert_rowid());

        tracing::info!("created account {id} for {}", new_account.email);

        Ok(Account {
            id,
            username: new_account.username,
            email: new_account.email,
            password_hash: new_account.password_hash,
            balance: STARTING_BALANCE,
        })
    }

    /// Get the account from the database that has the specified `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccountNotFound] if there is no account with the
    /// specified ID, or [Error::SqlError] if there are SQL related errors.
    fn get(&self, id: AccountID) -> Result<Account, Error> {
        let connection = self.connection.lock().unwrap();

        get_account(&connection, id)
    }

    /// Get the account from the database that has the specified `email`
    /// address.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccountNotFound] if there is no account with the
    /// specified email, or [Error::SqlError] if there are SQL related errors.
    fn get_by_email(&self, email: &EmailAddress) -> Result<Account, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, username, email, password, balance FROM account WHERE email = :email",
            )?
            .query_row(
                &[(":email", &email.to_string())],
                SQLiteAccountStore::map_row,
            )
            .map_err(|e| e.into())
    }

    /// Overwrite the mutable fields of an existing account.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccountNotFound] if the account is not in the
    /// database, [Error::DuplicateEmail] if the new email is taken by
    /// another account, or [Error::SqlError] for other SQL related errors.
    fn save(&mut self, account: &Account) -> Result<(), Error> {
        let connection = self.connection.lock().unwrap();

        let rows_changed = connection.execute(
            "UPDATE account SET username = ?1, email = ?2, password = ?3, balance = ?4 WHERE id = ?5",
            (
                &account.username,
                &account.email.to_string(),
                account.password_hash.to_string(),
                account.balance.to_string(),
                account.id.as_i64(),
            ),
        )?;

        if rows_changed == 0 {
            return Err(Error::AccountNotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteAccountStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS account (
                    id INTEGER PRIMARY KEY,
                    username TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL,
                    balance TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteAccountStore {
    type ReturnType = Account;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let username = row.get(offset + 1)?;
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;
        let raw_balance: String = row.get(offset + 4)?;

        let balance = Decimal::from_str_exact(&raw_balance).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 4,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        Ok(Account {
            id: AccountID::new(raw_id),
            username,
            email: EmailAddress::new_unchecked(raw_email),
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            balance,
        })
    }
}

/// Fetch a single account row over an already held connection.
///
/// Used by the transfer engine so the read happens inside its transaction.
pub(crate) fn get_account(connection: &Connection, id: AccountID) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, username, email, password, balance FROM account WHERE id = :id")?
        .query_row(&[(":id", &id.as_i64())], SQLiteAccountStore::map_row)
        .map_err(|e| e.into())
}

/// Write a single account's balance over an already held connection.
///
/// Used by the transfer engine so the write happens inside its transaction.
pub(crate) fn set_balance(
    connection: &Connection,
    id: AccountID,
    balance: Decimal,
) -> Result<(), Error> {
    let rows_changed = connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        (balance.to_string(), id.as_i64()),
    )?;

    if rows_changed == 0 {
        return Err(Error::AccountNotFound);
    }

    Ok(())
}

#[cfg(test)]
mod account_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        db::CreateTable,
        models::{AccountID, NewAccount, PasswordHash, STARTING_BALANCE},
    };

    use super::{AccountStore, Error, SQLiteAccountStore};

    fn get_store() -> SQLiteAccountStore {
        let conn = Connection::open_in_memory().unwrap();
        SQLiteAccountStore::create_table(&conn).unwrap();

        SQLiteAccountStore::new(Arc::new(Mutex::new(conn)))
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            username: "Test Account".to_string(),
            email: EmailAddress::from_str(email).unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_account_succeeds_with_starting_balance() {
        let mut store = get_store();

        let inserted_account = store.create(new_account("hello@world.com")).unwrap();

        assert!(inserted_account.id.as_i64() > 0);
        assert_eq!(
            inserted_account.email,
            EmailAddress::from_str("hello@world.com").unwrap()
        );
        assert_eq!(inserted_account.balance, STARTING_BALANCE);
    }

    #[test]
    fn insert_account_fails_on_duplicate_email() {
        let mut store = get_store();

        assert!(store.create(new_account("hello@world.com")).is_ok());

        assert_eq!(
            store.create(new_account("hello@world.com")).unwrap_err(),
            Error::DuplicateEmail
        );
    }

    #[test]
    fn get_account_fails_with_non_existent_id() {
        let store = get_store();

        let id = AccountID::new(42);

        assert_eq!(store.get(id), Err(Error::AccountNotFound));
    }

    #[test]
    fn get_account_succeeds_with_existing_id() {
        let mut store = get_store();

        let test_account = store.create(new_account("foo@bar.baz")).unwrap();

        let retrieved_account = store.get(test_account.id).unwrap();

        assert_eq!(retrieved_account, test_account);
    }

    #[test]
    fn get_account_fails_with_non_existent_email() {
        let store = get_store();

        // This email is not in the database.
        let email = EmailAddress::from_str("notavalidemail@foo.bar").unwrap();

        assert_eq!(store.get_by_email(&email), Err(Error::AccountNotFound));
    }

    #[test]
    fn get_account_succeeds_with_existing_email() {
        let mut store = get_store();

        let test_account = store.create(new_account("foo@bar.baz")).unwrap();

        let retrieved_account = store.get_by_email(&test_account.email).unwrap();

        assert_eq!(retrieved_account, test_account);
    }

    #[test]
    fn save_overwrites_mutable_fields() {
        let mut store = get_store();

        let mut account = store.create(new_account("foo@bar.baz")).unwrap();
        account.username = "Renamed".to_string();
        account.balance = Decimal::new(12_345, 2);

        store.save(&account).unwrap();

        let retrieved_account = store.get(account.id).unwrap();
        assert_eq!(retrieved_account, account);
    }

    #[test]
    fn save_fails_with_non_existent_account() {
        let mut store = get_store();

        let mut account = store.create(new_account("foo@bar.baz")).unwrap();
        account.id = AccountID::new(account.id.as_i64() + 1);

        assert_eq!(store.save(&account), Err(Error::AccountNotFound));
    }

    #[test]
    fn balance_round_trips_as_decimal() {
        let mut store = get_store();

        let mut account = store.create(new_account("foo@bar.baz")).unwrap();
        account.balance = Decimal::from_str("0.10").unwrap();
        store.save(&account).unwrap();

        let retrieved_account = store.get(account.id).unwrap();

        assert_eq!(retrieved_account.balance, Decimal::from_str("0.10").unwrap());
    }
}
