//! SQLite backed implementations of the store traits.
//!
//! Each store holds a shared handle to the one database connection. The
//! transfer engine borrows the same handle so its writes and the stores'
//! reads go through a single serialized connection.

mod account;
mod connection;
mod ledger;

pub use account::SQLiteAccountStore;
pub use connection::SQLiteConnectionStore;
pub use ledger::SQLiteLedgerStore;

pub(crate) use account::{get_account, set_balance};
pub(crate) use connection::edge_exists;
pub(crate) use ledger::insert_entry;
