use email_address::EmailAddress;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::PasswordHash;

/// The balance credited to every account when it is registered: 100.00 units.
pub const STARTING_BALANCE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 2);

/// The unique ID of an [Account].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountID(i64);

impl AccountID {
    /// Create an account ID from a raw database ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying database ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AccountID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user's identity plus their current balance.
///
/// The balance is a fixed-point decimal and is never negative. It is only
/// ever changed by the transfer engine; no other component may write it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The unique ID of the account.
    pub id: AccountID,
    /// The display name shown to other users.
    pub username: String,
    /// The account's email address. Unique across all accounts.
    pub email: EmailAddress,
    /// The salted and hashed login password.
    pub password_hash: PasswordHash,
    /// The funds currently held by the account.
    pub balance: Decimal,
}

/// The data for creating a new [Account].
///
/// The balance is not part of this type: new accounts always start at
/// [STARTING_BALANCE].
pub struct NewAccount {
    /// The display name shown to other users.
    pub username: String,
    /// The account's email address.
    pub email: EmailAddress,
    /// The salted and hashed login password.
    pub password_hash: PasswordHash,
}
