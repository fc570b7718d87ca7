//! Accounts that own an ordered sequence of ledger entries.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    balance::{final_balance, statement_rows, BalanceTotals, StatementRow},
    common::*,
    entry::LedgerEntry,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Enumerates the kinds of parties a book keeps ledgers for.
///
/// Every kind folds `debit - credit`; [`AccountKind::positive_balance_meaning`]
/// states what a positive result means for that kind.
pub enum AccountKind {
    Customer,
    Company,
    Traveler,
    Cashbox,
}

impl AccountKind {
    pub fn positive_balance_meaning(self) -> &'static str {
        match self {
            AccountKind::Customer => "customer owes us",
            AccountKind::Company => "we owe the company",
            AccountKind::Traveler => "traveler owes us",
            AccountKind::Cashbox => "cash on hand",
        }
    }

    pub fn debit_meaning(self) -> &'static str {
        match self {
            AccountKind::Customer => "charge to customer",
            AccountKind::Company => "service bought from company",
            AccountKind::Traveler => "service sold to traveler",
            AccountKind::Cashbox => "receipt",
        }
    }

    pub fn credit_meaning(self) -> &'static str {
        match self {
            AccountKind::Customer => "payment from customer",
            AccountKind::Company => "payment to company",
            AccountKind::Traveler => "payment from traveler",
            AccountKind::Cashbox => "payment",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Customer => "Customer",
            AccountKind::Company => "Company",
            AccountKind::Traveler => "Traveler",
            AccountKind::Cashbox => "Cashbox",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub kind: AccountKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Insertion order; never re-sorted.
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            code: None,
            name: name.into(),
            currency: normalize_currency(&currency.into()),
            phone: None,
            notes: None,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.code = if code.trim().is_empty() {
            None
        } else {
            Some(code.trim().to_string())
        };
        self
    }

    pub fn cashbox(currency: impl Into<String>) -> Self {
        let currency = normalize_currency(&currency.into());
        Self::new(format!("Cashbox {currency}"), AccountKind::Cashbox, currency.clone())
            .with_code(currency)
    }

    pub fn balance(&self) -> Decimal {
        final_balance(&self.entries)
    }

    pub fn totals(&self) -> BalanceTotals {
        BalanceTotals::of(&self.entries)
    }

    pub fn statement(&self, order: DisplayOrder) -> Vec<StatementRow> {
        statement_rows(&self.entries, order)
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|own| normalize_code(own) == normalize_code(code))
    }

    pub(crate) fn push_entry(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }
}

impl Identifiable for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        match &self.code {
            Some(code) => format!("{} [{}] ({})", self.name, code, self.kind),
            None => format!("{} ({})", self.name, self.kind),
        }
    }
}
