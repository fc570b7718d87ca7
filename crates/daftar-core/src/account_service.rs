//! Validated helpers for opening, finding, and deleting accounts.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use daftar_domain::{normalize_currency, Account, AccountKind, Book};

use crate::CoreError;

/// Fields accepted when opening a customer, company, or traveler account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewAccount {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            currency: None,
            phone: None,
            notes: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

pub struct AccountService;

impl AccountService {
    /// Opens an account of `kind`. Cashboxes are opened by the cashbox service.
    pub fn open(
        book: &mut Book,
        kind: AccountKind,
        request: NewAccount,
    ) -> Result<Uuid, CoreError> {
        if kind == AccountKind::Cashbox {
            return Err(CoreError::InvalidOperation(
                "cashboxes are opened per currency, not by name".into(),
            ));
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("account name is required".into()));
        }
        if let Some(code) = request.code.as_deref().filter(|code| !code.trim().is_empty()) {
            Self::ensure_code_available(book, kind, code)?;
        }
        let currency = request
            .currency
            .as_deref()
            .map(normalize_currency)
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| book.base_currency.clone());

        let mut account = Account::new(name, kind, currency);
        if let Some(code) = request.code {
            account = account.with_code(code);
        }
        account.phone = request.phone;
        account.notes = request.notes;
        let id = book.add_account(account);
        info!(%id, %kind, "account opened");
        Ok(id)
    }

    /// Deletes the account together with its whole ledger. Cashboxes stay.
    pub fn remove(book: &mut Book, id: Uuid) -> Result<Account, CoreError> {
        if Self::get(book, id)?.kind == AccountKind::Cashbox {
            return Err(CoreError::InvalidOperation("cashboxes cannot be deleted".into()));
        }
        let removed = book.remove_account(id).ok_or(CoreError::AccountNotFound(id))?;
        info!(%id, kind = %removed.kind, entries = removed.entries.len(), "account deleted");
        Ok(removed)
    }

    pub fn get(book: &Book, id: Uuid) -> Result<&Account, CoreError> {
        book.account(id).ok_or(CoreError::AccountNotFound(id))
    }

    /// Like [`AccountService::get`], but an account of another kind counts as missing.
    pub fn get_of_kind(book: &Book, id: Uuid, kind: AccountKind) -> Result<&Account, CoreError> {
        book.account(id)
            .filter(|account| account.kind == kind)
            .ok_or(CoreError::AccountNotFound(id))
    }

    pub fn list(book: &Book, kind: AccountKind) -> Vec<&Account> {
        book.accounts_of(kind).collect()
    }

    fn ensure_code_available(book: &Book, kind: AccountKind, code: &str) -> Result<(), CoreError> {
        if book.account_by_code(kind, code).is_some() {
            Err(CoreError::DuplicateCode(code.trim().to_string()))
        } else {
            Ok(())
        }
    }
}
