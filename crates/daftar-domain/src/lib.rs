//! daftar-domain
//!
//! Pure domain models (Book, Account, LedgerEntry, Period, Transaction, etc.).
//! No I/O, no HTTP, no storage. Only data types, balance folds and core enums.

pub mod account;
pub mod balance;
pub mod book;
pub mod common;
pub mod entry;
pub mod event;
pub mod period;
pub mod transaction;

pub use account::*;
pub use balance::*;
pub use book::*;
pub use common::*;
pub use entry::*;
pub use event::*;
pub use period::*;
pub use transaction::*;
