use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::Mutex,
};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::warn;

use daftar_domain::{AccountKind, Book};

use crate::CoreError;

/// Describes a persisted backup artifact for a book.
#[derive(Debug, Clone)]
pub struct BookBackupInfo {
    pub book: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing books and backups.
pub trait BookStorage: Send + Sync {
    fn save_book(&self, name: &str, book: &Book) -> Result<(), CoreError>;
    /// Fails with [`CoreError::BookNotFound`] when nothing is stored under `name`.
    fn load_book(&self, name: &str) -> Result<Book, CoreError>;
    fn list_books(&self) -> Result<Vec<String>, CoreError>;
    fn delete_book(&self, name: &str) -> Result<(), CoreError>;
    fn backup_book(
        &self,
        name: &str,
        book: &Book,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<Book, CoreError>;
}

/// Detects dangling references and other anomalies within a book snapshot.
pub fn book_warnings(book: &Book) -> Vec<String> {
    let account_ids: HashSet<_> = book.accounts.iter().map(|a| a.id).collect();
    let mut warnings = Vec::new();

    let active = book.active_periods().count();
    if active > 1 {
        warnings.push(format!("{active} periods are active at once"));
    }

    for txn in &book.transactions {
        if let Some(customer) = txn.customer_id {
            if !account_ids.contains(&customer) {
                warnings.push(format!(
                    "transaction {} references unknown customer {}",
                    txn.id, customer
                ));
            }
        }
        if book.entries_for_posting(txn.posting_id).is_empty() {
            warnings.push(format!(
                "transaction {} has no ledger entries for posting {}",
                txn.id, txn.posting_id
            ));
        }
    }

    for cashbox in book.accounts_of(AccountKind::Cashbox) {
        let balance = cashbox.balance();
        if balance < Decimal::ZERO {
            warnings.push(format!(
                "cashbox {} holds a negative balance {}",
                cashbox.currency, balance
            ));
        }
    }
    warnings
}

/// Process-local storage, used for tests and ephemeral servers.
#[derive(Default)]
pub struct MemoryBookStorage {
    books: Mutex<HashMap<String, Book>>,
    backups: Mutex<HashMap<String, Vec<(BookBackupInfo, Book)>>>,
}

impl MemoryBookStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> CoreError {
    CoreError::Storage("memory storage lock poisoned".into())
}

impl BookStorage for MemoryBookStorage {
    fn save_book(&self, name: &str, book: &Book) -> Result<(), CoreError> {
        self.books
            .lock()
            .map_err(poisoned)?
            .insert(name.to_string(), book.clone());
        Ok(())
    }

    fn load_book(&self, name: &str) -> Result<Book, CoreError> {
        self.books
            .lock()
            .map_err(poisoned)?
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::BookNotFound(name.to_string()))
    }

    fn list_books(&self) -> Result<Vec<String>, CoreError> {
        let mut names: Vec<String> = self.books.lock().map_err(poisoned)?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_book(&self, name: &str) -> Result<(), CoreError> {
        self.books.lock().map_err(poisoned)?.remove(name);
        Ok(())
    }

    fn backup_book(
        &self,
        name: &str,
        book: &Book,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        let mut backups = self.backups.lock().map_err(poisoned)?;
        let entries = backups.entry(name.to_string()).or_default();
        let created_at = Utc::now().to_rfc3339();
        let id = match note {
            Some(note) => format!("{}_{}_{}", name, entries.len(), note),
            None => format!("{}_{}", name, entries.len()),
        };
        let info = BookBackupInfo {
            book: name.to_string(),
            id: id.clone(),
            created_at,
            path: PathBuf::from(id),
        };
        entries.push((info.clone(), book.clone()));
        Ok(info)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError> {
        let backups = self.backups.lock().map_err(poisoned)?;
        Ok(backups
            .get(name)
            .map(|entries| entries.iter().rev().map(|(info, _)| info.clone()).collect())
            .unwrap_or_default())
    }

    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<Book, CoreError> {
        let book = {
            let backups = self.backups.lock().map_err(poisoned)?;
            backups
                .get(&backup.book)
                .and_then(|entries| entries.iter().find(|(info, _)| info.id == backup.id))
                .map(|(_, book)| book.clone())
                .ok_or_else(|| CoreError::Storage(format!("backup `{}` not found", backup.id)))?
        };
        self.save_book(&backup.book, &book)?;
        Ok(book)
    }
}

/// Tries `primary` first and falls back to a local mirror when it fails.
///
/// Failures of the primary store are logged at `warn` level and never surface
/// to the caller unless the fallback fails as well, in which case the
/// primary's error is returned. [`CoreError::BookNotFound`] only ever comes
/// from the primary, so an unreadable book is never mistaken for a missing one.
pub struct FallbackStorage {
    primary: Box<dyn BookStorage>,
    fallback: Box<dyn BookStorage>,
}

impl FallbackStorage {
    pub fn new(primary: Box<dyn BookStorage>, fallback: Box<dyn BookStorage>) -> Self {
        Self { primary, fallback }
    }

    fn with_fallback<T>(
        &self,
        operation: &str,
        call: impl Fn(&dyn BookStorage) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        match call(self.primary.as_ref()) {
            Ok(value) => Ok(value),
            Err(CoreError::BookNotFound(name)) => {
                // Not a failure of the primary; only use the mirror if it knows the book.
                call(self.fallback.as_ref()).map_err(|_| CoreError::BookNotFound(name))
            }
            Err(err) => {
                warn!(operation, error = %err, "primary storage failed, using local mirror");
                call(self.fallback.as_ref()).map_err(|mirror| {
                    warn!(operation, error = %mirror, "local mirror failed as well");
                    err
                })
            }
        }
    }
}

impl BookStorage for FallbackStorage {
    fn save_book(&self, name: &str, book: &Book) -> Result<(), CoreError> {
        self.with_fallback("save_book", |storage| storage.save_book(name, book))
    }

    fn load_book(&self, name: &str) -> Result<Book, CoreError> {
        self.with_fallback("load_book", |storage| storage.load_book(name))
    }

    fn list_books(&self) -> Result<Vec<String>, CoreError> {
        self.with_fallback("list_books", |storage| storage.list_books())
    }

    fn delete_book(&self, name: &str) -> Result<(), CoreError> {
        self.with_fallback("delete_book", |storage| storage.delete_book(name))
    }

    fn backup_book(
        &self,
        name: &str,
        book: &Book,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        self.with_fallback("backup_book", |storage| storage.backup_book(name, book, note))
    }

    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError> {
        self.with_fallback("list_backups", |storage| storage.list_backups(name))
    }

    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<Book, CoreError> {
        self.with_fallback("restore_backup", |storage| storage.restore_backup(backup))
    }
}
