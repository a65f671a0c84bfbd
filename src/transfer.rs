//! The transfer engine: validates and executes a transfer between two
//! accounts, enforcing the balance and authorization invariants atomically.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    Error,
    models::{AccountID, LedgerEntry, NewLedgerEntry},
    stores::sqlite::{edge_exists, get_account, insert_entry, set_balance},
};

/// How many times a transfer is retried when the database reports a
/// conflicting concurrent update before the conflict is surfaced.
const MAX_TRANSFER_ATTEMPTS: u32 = 3;

/// Moves funds between accounts.
///
/// A transfer debits the sender, credits the receiver, and appends one
/// ledger entry. The three writes happen inside a single immediate database
/// transaction: either all of them commit or none do, so no reader can ever
/// observe a half-applied transfer, and two concurrent debits can never both
/// pass the balance check against a stale balance.
#[derive(Debug, Clone)]
pub struct TransferService {
    connection: Arc<Mutex<Connection>>,
}

impl TransferService {
    /// Create a new transfer service on the shared database connection.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Transfer `amount` from `sender` to `receiver`, recording it with
    /// `description`.
    ///
    /// The preconditions are checked in order, each short-circuiting:
    /// 1. `amount` must be greater than zero ([Error::InvalidAmount]).
    /// 2. `sender` and `receiver` must differ ([Error::SelfTransfer]).
    /// 3. Both accounts must exist ([Error::AccountNotFound]).
    /// 4. `sender` must have added `receiver` as a connection
    ///    ([Error::UnauthorizedCounterparty]).
    /// 5. The sender's balance must cover `amount`
    ///    ([Error::InsufficientBalance]).
    ///
    /// On success the returned [LedgerEntry] carries the server-assigned ID
    /// and timestamp. On failure no state is changed.
    ///
    /// A transient [Error::StorageConflict] is retried internally a bounded
    /// number of times before being returned.
    ///
    /// No fee is deducted; transfers move exactly `amount`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    pub fn transfer(
        &self,
        sender: AccountID,
        receiver: AccountID,
        amount: Decimal,
        description: &str,
    ) -> Result<LedgerEntry, Error> {
        tracing::info!("attempting transfer of {amount} from {sender} to {receiver}");

        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        if sender == receiver {
            return Err(Error::SelfTransfer);
        }

        let mut attempts = 0;
        loop {
            attempts += 1;

            match self.execute_transfer(sender, receiver, amount, description) {
                Err(Error::StorageConflict) if attempts < MAX_TRANSFER_ATTEMPTS => {
                    tracing::warn!(
                        "transfer from {sender} to {receiver} hit a storage conflict \
                         (attempt {attempts}), retrying"
                    );
                }
                result => return result,
            }
        }
    }

    /// Run one attempt of the read-check-write cycle inside an immediate
    /// transaction.
    fn execute_transfer(
        &self,
        sender: AccountID,
        receiver: AccountID,
        amount: Decimal,
        description: &str,
    ) -> Result<LedgerEntry, Error> {
        let mut connection = self.connection.lock().unwrap();
        let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sender_account = get_account(&transaction, sender)?;
        let receiver_account = get_account(&transaction, receiver)?;

        if !edge_exists(&transaction, sender, receiver)? {
            tracing::warn!("account {sender} is not connected to {receiver}, refusing transfer");
            return Err(Error::UnauthorizedCounterparty);
        }

        if sender_account.balance < amount {
            tracing::error!("insufficient balance on account {sender} for transfer of {amount}");
            return Err(Error::InsufficientBalance);
        }

        set_balance(&transaction, sender, sender_account.balance - amount)?;
        set_balance(&transaction, receiver, receiver_account.balance + amount)?;

        let entry = insert_entry(
            &transaction,
            NewLedgerEntry {
                sender,
                receiver,
                amount,
                description: description.to_string(),
            },
            OffsetDateTime::now_utc(),
        )?;

        transaction.commit()?;

        tracing::info!(
            "transferred {amount} from {} to {}",
            sender_account.email,
            receiver_account.email
        );

        Ok(entry)
    }
}
