use std::sync::Arc;

use tracing::{info, warn};

use daftar_domain::{Book, CURRENT_SCHEMA_VERSION};

use crate::{
    storage::{book_warnings, BookBackupInfo, BookStorage},
    time::Clock,
    CoreError,
};

/// Facade that owns the working book and coordinates persistence and backups.
///
/// Every mutation goes through [`BookManager::transact`]: the closure runs on a
/// copy of the book, the copy is persisted, and only then does it replace the
/// working book. A failing closure or save leaves the working book untouched.
pub struct BookManager {
    book: Book,
    name: String,
    storage: Box<dyn BookStorage>,
    clock: Arc<dyn Clock>,
}

impl BookManager {
    /// Loads `name` from storage, creating an empty book when none exists yet.
    ///
    /// Only [`CoreError::BookNotFound`] leads to a new book; a book that exists
    /// but cannot be read fails the call and is left as it is on disk.
    pub fn open(
        name: &str,
        storage: Box<dyn BookStorage>,
        clock: Arc<dyn Clock>,
        base_currency: &str,
    ) -> Result<Self, CoreError> {
        let book = match storage.load_book(name) {
            Ok(book) => {
                Self::ensure_schema_support(book.schema_version)?;
                for warning in book_warnings(&book) {
                    warn!(book = name, "{warning}");
                }
                info!(book = name, accounts = book.accounts.len(), "book loaded");
                book
            }
            Err(CoreError::BookNotFound(_)) => {
                let book = Book::new(name, base_currency);
                storage.save_book(name, &book)?;
                info!(book = name, currency = %book.base_currency, "book created");
                book
            }
            Err(err) => return Err(err),
        };
        Ok(Self {
            book,
            name: name.to_string(),
            storage,
            clock,
        })
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Applies `change` atomically and persists the result.
    pub fn transact<T>(
        &mut self,
        change: impl FnOnce(&mut Book, &dyn Clock) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut draft = self.book.clone();
        let value = change(&mut draft, self.clock.as_ref())?;
        draft.updated_at = self.clock.now();
        self.storage.save_book(&self.name, &draft)?;
        self.book = draft;
        Ok(value)
    }

    pub fn backup(&self, note: Option<&str>) -> Result<BookBackupInfo, CoreError> {
        let info = self.storage.backup_book(&self.name, &self.book, note)?;
        info!(book = %self.name, backup = %info.id, "backup created");
        Ok(info)
    }

    pub fn list_backups(&self) -> Result<Vec<BookBackupInfo>, CoreError> {
        self.storage.list_backups(&self.name)
    }

    /// Replaces the working book with a backup snapshot.
    pub fn restore_backup(&mut self, backup: &BookBackupInfo) -> Result<(), CoreError> {
        let book = self.storage.restore_backup(backup)?;
        Self::ensure_schema_support(book.schema_version)?;
        self.book = book;
        info!(book = %self.name, backup = %backup.id, "backup restored");
        Ok(())
    }

    /// Re-reads the book from storage, discarding the in-memory copy.
    pub fn reload(&mut self) -> Result<(), CoreError> {
        let book = self.storage.load_book(&self.name)?;
        Self::ensure_schema_support(book.schema_version)?;
        self.book = book;
        Ok(())
    }

    fn ensure_schema_support(schema_version: u8) -> Result<(), CoreError> {
        if schema_version > CURRENT_SCHEMA_VERSION {
            return Err(CoreError::Storage(format!(
                "book schema v{} is newer than supported v{}",
                schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }
}
