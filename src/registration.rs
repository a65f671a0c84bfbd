//! Account registration.
//!
//! Registration is the only place accounts are created. The password hasher
//! configuration is injected through the constructor rather than read from
//! ambient global state, so callers (and tests) control the hashing cost.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{Account, NewAccount, PasswordHash},
    stores::AccountStore,
};

/// Creates accounts with a validated, hashed password and the fixed starting
/// balance.
pub struct Registrar<S> {
    account_store: S,
    hash_cost: u32,
}

impl<S> Registrar<S>
where
    S: AccountStore,
{
    /// Create a registrar that hashes passwords with the given bcrypt
    /// `hash_cost`.
    ///
    /// Pass [PasswordHash::DEFAULT_COST] outside of tests.
    pub fn new(account_store: S, hash_cost: u32) -> Self {
        Self {
            account_store,
            hash_cost,
        }
    }

    /// Register a new account.
    ///
    /// The password is checked for strength and hashed; the account starts
    /// with the fixed starting balance.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] if the password fails the strength check,
    /// [Error::DuplicateEmail] if the email address is taken, or
    /// [Error::HashingError]/[Error::SqlError] for hashing and storage
    /// failures.
    pub fn register(
        &mut self,
        username: &str,
        email: EmailAddress,
        password: &str,
    ) -> Result<Account, Error> {
        tracing::info!("registering new account for {email}");

        let password_hash = PasswordHash::from_raw_password(password, self.hash_cost)?;

        self.account_store.create(NewAccount {
            username: username.to_string(),
            email,
            password_hash,
        })
    }

    /// Replace an account's password, re-hashing through the configured
    /// cost.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] if the new password fails the strength
    /// check, or [Error::AccountNotFound] if the account no longer exists.
    pub fn update_password(&mut self, account: &mut Account, new_password: &str) -> Result<(), Error> {
        tracing::info!("updating password for {}", account.email);

        account.password_hash = PasswordHash::from_raw_password(new_password, self.hash_cost)?;
        self.account_store.save(account)
    }
}
