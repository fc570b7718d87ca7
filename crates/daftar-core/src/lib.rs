//! daftar-core
//!
//! Bookkeeping services for Daftar: statements, postings, cashbox movements,
//! accounting periods, and traveler registrations.
//! Depends on daftar-domain. No HTTP, no terminal I/O; persistence only through
//! the [`storage::BookStorage`] trait.

pub mod account_service;
pub mod book_manager;
pub mod cashbox_service;
pub mod error;
pub mod ledger_service;
pub mod period_service;
pub mod posting_service;
pub mod storage;
pub mod time;
pub mod traveler_service;

pub use account_service::*;
pub use book_manager::*;
pub use cashbox_service::*;
pub use error::CoreError;
pub use ledger_service::*;
pub use period_service::*;
pub use posting_service::*;
pub use traveler_service::*;
