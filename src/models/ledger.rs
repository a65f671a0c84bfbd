use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::{AccountID, DatabaseID};

/// One immutable record of a completed transfer.
///
/// Ledger entries are created exactly once by the transfer engine, inside
/// the same database transaction as the two balance updates. They are never
/// updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The unique ID of the entry. IDs are assigned in insertion order.
    pub id: DatabaseID,
    /// The account the funds were taken from.
    pub sender: AccountID,
    /// The account the funds were given to.
    pub receiver: AccountID,
    /// The amount moved. Always greater than zero.
    pub amount: Decimal,
    /// A free-text note attached by the sender. May be empty.
    pub description: String,
    /// When the transfer was committed. Assigned by the server.
    pub created_at: OffsetDateTime,
}

/// The data for recording a new [LedgerEntry].
///
/// The ID and timestamp are not part of this type; both are assigned by the
/// ledger store at commit time.
pub struct NewLedgerEntry {
    /// The account the funds are taken from.
    pub sender: AccountID,
    /// The account the funds are given to.
    pub receiver: AccountID,
    /// The amount to record. Must be greater than zero.
    pub amount: Decimal,
    /// A free-text note attached by the sender.
    pub description: String,
}
