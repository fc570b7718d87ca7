//! Immutable debit/credit records and the drafts they are created from.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Caller-supplied content of a ledger entry before it is stamped and stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
}

impl EntryDraft {
    pub fn new_debit(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    pub fn new_credit(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    /// Signed effect on a `debit - credit` balance.
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    pub fn has_negative_side(&self) -> bool {
        self.debit < Decimal::ZERO || self.credit < Decimal::ZERO
    }
}

/// One dated debit/credit record owned by exactly one account or period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Shared by every entry written in the same posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn from_draft(
        draft: EntryDraft,
        posting_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: draft.date,
            description: draft.description,
            debit: draft.debit,
            credit: draft.credit,
            posting_id,
            created_at,
        }
    }

    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }
}

impl Identifiable for LedgerEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for LedgerEntry {
    fn display_label(&self) -> String {
        format!("{} {} (+{} / -{})", self.date, self.description, self.debit, self.credit)
    }
}

/// Anything that contributes a debit and a credit to a balance fold.
pub trait DebitCredit {
    fn debit(&self) -> Decimal;
    fn credit(&self) -> Decimal;
}

impl DebitCredit for LedgerEntry {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

impl DebitCredit for EntryDraft {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

impl DebitCredit for (Decimal, Decimal) {
    fn debit(&self) -> Decimal {
        self.0
    }

    fn credit(&self) -> Decimal {
        self.1
    }
}
