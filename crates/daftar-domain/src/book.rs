//! The book: aggregate root holding every account, period, and cashbox movement
//! of one business. Its JSON form is the persisted snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    account::{Account, AccountKind},
    common::*,
    entry::{EntryDraft, LedgerEntry},
    period::Period,
    transaction::{BalanceAdjustment, Transaction},
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub name: String,
    pub base_currency: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub adjustments: Vec<BalanceAdjustment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Book::schema_version_default")]
    pub schema_version: u8,
}

impl Book {
    pub fn new(name: impl Into<String>, base_currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            base_currency: normalize_currency(&base_currency.into()),
            accounts: Vec::new(),
            periods: Vec::new(),
            transactions: Vec::new(),
            adjustments: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        self.touch();
        id
    }

    pub fn remove_account(&mut self, id: Uuid) -> Option<Account> {
        let index = self.accounts.iter().position(|account| account.id == id)?;
        let removed = self.accounts.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn accounts_of(&self, kind: AccountKind) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(move |account| account.kind == kind)
    }

    pub fn account_by_code(&self, kind: AccountKind, code: &str) -> Option<&Account> {
        self.accounts_of(kind).find(|account| account.matches_code(code))
    }

    pub fn cashbox(&self, currency: &str) -> Option<&Account> {
        self.account_by_code(AccountKind::Cashbox, &normalize_currency(currency))
    }

    /// Returns the cashbox for `currency`, opening an empty one if missing.
    pub fn ensure_cashbox(&mut self, currency: &str) -> Uuid {
        if let Some(id) = self.cashbox(currency).map(|account| account.id) {
            return id;
        }
        self.add_account(Account::cashbox(currency))
    }

    pub fn cashbox_balance(&self, currency: &str) -> Decimal {
        self.cashbox(currency)
            .map(Account::balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Appends an entry to an account. Returns `None` when the account is unknown.
    pub fn append_entry(
        &mut self,
        account_id: Uuid,
        draft: EntryDraft,
        posting_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Option<Uuid> {
        let account = self.account_mut(account_id)?;
        let entry = LedgerEntry::from_draft(draft, posting_id, created_at);
        let id = entry.id;
        account.push_entry(entry);
        self.touch();
        Some(id)
    }

    pub fn entries_for_posting(&self, posting_id: Uuid) -> Vec<(&Account, &LedgerEntry)> {
        self.accounts
            .iter()
            .flat_map(|account| account.entries.iter().map(move |entry| (account, entry)))
            .filter(|(_, entry)| entry.posting_id == Some(posting_id))
            .collect()
    }

    pub fn period(&self, id: Uuid) -> Option<&Period> {
        self.periods.iter().find(|period| period.id == id)
    }

    pub fn period_mut(&mut self, id: Uuid) -> Option<&mut Period> {
        self.periods.iter_mut().find(|period| period.id == id)
    }

    pub fn active_periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter().filter(|period| period.is_active())
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        self.touch();
        id
    }

    pub fn add_adjustment(&mut self, adjustment: BalanceAdjustment) -> Uuid {
        let id = adjustment.id;
        self.adjustments.push(adjustment);
        self.touch();
        id
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

impl Identifiable for Book {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Book {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn new_book_is_empty_and_current_schema() {
        let book = Book::new("Agency", "usd");
        assert_eq!(book.base_currency, "USD");
        assert_eq!(book.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(book.accounts.is_empty());
        assert!(book.periods.is_empty());
    }

    #[test]
    fn ensure_cashbox_is_idempotent_per_currency() {
        let mut book = Book::new("Agency", "USD");
        let usd = book.ensure_cashbox("USD");
        assert_eq!(book.ensure_cashbox("usd"), usd);
        let sar = book.ensure_cashbox("SAR");
        assert_ne!(usd, sar);
        assert_eq!(book.accounts_of(AccountKind::Cashbox).count(), 2);
    }

    #[test]
    fn append_entry_to_unknown_account_is_none() {
        let mut book = Book::new("Agency", "USD");
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let draft = EntryDraft::new_debit(date, "ghost", dec!(1));
        assert!(book
            .append_entry(Uuid::new_v4(), draft, None, Utc::now())
            .is_none());
    }

    #[test]
    fn snapshot_survives_json_roundtrip() {
        let mut book = Book::new("Clinic", "USD");
        let cashbox = book.ensure_cashbox("USD");
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        book.append_entry(
            cashbox,
            EntryDraft::new_debit(date, "opening", dec!(12.34)),
            None,
            Utc::now(),
        );

        let json = serde_json::to_string(&book).unwrap();
        let restored: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.cashbox_balance("USD"), dec!(12.34));
        assert_eq!(restored, book);
    }
}
