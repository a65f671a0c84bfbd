//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).

mod account;
mod connection;
mod ledger;

pub mod sqlite;

pub use account::AccountStore;
pub use connection::{ConnectOutcome, ConnectionStore};
pub use ledger::LedgerStore;
