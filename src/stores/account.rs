//! Defines the account store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{Account, AccountID, NewAccount},
};

/// Handles the creation and retrieval of accounts.
pub trait AccountStore {
    /// Create a new account with the fixed starting balance.
    ///
    /// Returns [Error::DuplicateEmail] if the email address is already in
    /// use.
    fn create(&mut self, new_account: NewAccount) -> Result<Account, Error>;

    /// Get an account by its ID.
    ///
    /// Returns [Error::AccountNotFound] if no account with the given ID
    /// exists.
    fn get(&self, id: AccountID) -> Result<Account, Error>;

    /// Get an account by its email address.
    ///
    /// Returns [Error::AccountNotFound] if no account with the given email
    /// exists.
    fn get_by_email(&self, email: &EmailAddress) -> Result<Account, Error>;

    /// Overwrite the mutable fields (username, email, password hash,
    /// balance) of an existing account.
    ///
    /// Returns [Error::AccountNotFound] if the account does not exist.
    fn save(&mut self, account: &Account) -> Result<(), Error>;
}
