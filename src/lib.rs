//! Paybuddy is a small payments core: registered users hold an internal cash
//! balance and can send money to other users they have explicitly connected
//! with. Every completed transfer is recorded as an immutable ledger entry.
//!
//! This library exposes the transfer engine, the stores backing it, and the
//! read path for reconstructing an account's transaction history. It does not
//! parse requests or render pages; a presentation layer is expected to sit on
//! top of it.

#![warn(missing_docs)]

use rust_decimal::Decimal;

pub mod db;
pub mod models;
pub mod registration;
pub mod stores;
pub mod transfer;

pub use db::initialize as initialize_db;
pub use registration::Registrar;
pub use transfer::TransferService;

/// The errors that may occur in the payments core.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transfer was requested with a zero or negative amount.
    #[error("transfer amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// A transfer was requested from an account to itself.
    ///
    /// Self-transfers are rejected outright rather than recorded as no-op
    /// ledger entries.
    #[error("sender and receiver must be different accounts")]
    SelfTransfer,

    /// No account matched the given ID or email address.
    ///
    /// A malformed or missing counterparty is always reported with this
    /// variant, never as a raw SQL error.
    #[error("no account found with the given details")]
    AccountNotFound,

    /// The sender has not added the receiver as a connection, so the
    /// transfer is not permitted.
    #[error("the sender is not connected to the receiver")]
    UnauthorizedCounterparty,

    /// The sender's balance does not cover the requested amount.
    #[error("the sender's balance does not cover the transfer amount")]
    InsufficientBalance,

    /// The email used to create an account is already in use. The client
    /// should try again with a different email address.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The database rejected the operation because of a conflicting
    /// concurrent update. The operation is safe to retry as a whole.
    #[error("the operation conflicted with a concurrent update and can be retried")]
    StorageConflict,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred in the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server,
    /// not shown to the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy
                    || sql_error.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Error::StorageConflict
            }
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
