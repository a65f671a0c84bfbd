//! This module defines the domain data types.

pub use account::{Account, AccountID, NewAccount, STARTING_BALANCE};
pub use ledger::{LedgerEntry, NewLedgerEntry};
pub use password::{PasswordHash, ValidatedPassword};

mod account;
mod ledger;
mod password;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
