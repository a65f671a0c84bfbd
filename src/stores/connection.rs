//! Defines the connection graph store trait.

use crate::{Error, models::AccountID};

/// The result of adding a connection edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new edge was written.
    Created,
    /// The exact edge already existed; nothing was written.
    AlreadyExists,
}

/// Stores the directed "may I pay you" permission edges between accounts.
///
/// Edges are strictly directional: `connect(a, b)` does not imply that `b`
/// may pay `a`. No reciprocal edge is ever written implicitly.
pub trait ConnectionStore {
    /// Add a permission edge from `account` to `counterparty`.
    ///
    /// Idempotent: re-adding an existing edge reports
    /// [ConnectOutcome::AlreadyExists] and performs no write.
    ///
    /// Returns [Error::AccountNotFound] if either account does not exist.
    fn connect(
        &mut self,
        account: AccountID,
        counterparty: AccountID,
    ) -> Result<ConnectOutcome, Error>;

    /// Whether the exact ordered edge `account` → `counterparty` is stored.
    fn is_authorized(&self, account: AccountID, counterparty: AccountID) -> Result<bool, Error>;
}
