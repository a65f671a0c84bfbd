//! Defines the ledger store trait.

use crate::{
    Error,
    models::{AccountID, DatabaseID, LedgerEntry},
};

/// Read access to the append-only record of completed transfers.
///
/// Entries are written exclusively by the
/// [transfer engine](crate::TransferService), inside the same database
/// transaction as the balance updates, so the write path does not appear on
/// this trait.
pub trait LedgerStore {
    /// Get a single ledger entry by its ID.
    fn get(&self, id: DatabaseID) -> Result<LedgerEntry, Error>;

    /// Every ledger entry where `account` is the sender or the receiver,
    /// most recent first.
    ///
    /// Entries with the same timestamp keep their insertion order. The
    /// result is a finite snapshot, recomputed on each call.
    fn history_for(&self, account: AccountID) -> Result<Vec<LedgerEntry>, Error>;
}
