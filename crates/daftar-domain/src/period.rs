//! Accounting periods: an active span of income/expense entries that can be
//! closed exactly once, freezing its summary.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    balance::{statement_rows, BalanceTotals, StatementRow},
    common::*,
    entry::{EntryDraft, LedgerEntry},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Active,
    Closed,
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PeriodStatus::Active => "Active",
            PeriodStatus::Closed => "Closed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Totals frozen when a period closes. Debits are income, credits expense.
pub struct PeriodSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub profit: Decimal,
}

impl PeriodSummary {
    pub fn from_entries(entries: &[LedgerEntry]) -> Self {
        let totals = BalanceTotals::of(entries);
        Self {
            total_income: totals.total_debit,
            total_expense: totals.total_credit,
            profit: totals.total_debit - totals.total_credit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised by period transitions.
pub enum PeriodError {
    AlreadyClosed,
    EndBeforeStart,
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::AlreadyClosed => f.write_str("period is closed"),
            PeriodError::EndBeforeStart => f.write_str("period end date precedes its start date"),
        }
    }
}

impl std::error::Error for PeriodError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Period {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub status: PeriodStatus,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PeriodSummary>,
}

impl Period {
    pub fn open(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date: None,
            status: PeriodStatus::Active,
            entries: Vec::new(),
            summary: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PeriodStatus::Active
    }

    /// Appends an entry. Closed periods reject every write.
    pub fn record(
        &mut self,
        draft: EntryDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Uuid, PeriodError> {
        if !self.is_active() {
            return Err(PeriodError::AlreadyClosed);
        }
        let entry = LedgerEntry::from_draft(draft, None, created_at);
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// `active -> closed`. There is no way back.
    pub fn close(&mut self, end_date: NaiveDate) -> Result<PeriodSummary, PeriodError> {
        if !self.is_active() {
            return Err(PeriodError::AlreadyClosed);
        }
        if end_date < self.start_date {
            return Err(PeriodError::EndBeforeStart);
        }
        let summary = PeriodSummary::from_entries(&self.entries);
        self.summary = Some(summary);
        self.end_date = Some(end_date);
        self.status = PeriodStatus::Closed;
        Ok(summary)
    }

    /// Frozen summary when closed, live totals otherwise.
    pub fn current_summary(&self) -> PeriodSummary {
        self.summary
            .unwrap_or_else(|| PeriodSummary::from_entries(&self.entries))
    }

    pub fn statement(&self, order: DisplayOrder) -> Vec<StatementRow> {
        statement_rows(&self.entries, order)
    }
}

impl Identifiable for Period {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Period {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Period {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.name, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn closing_freezes_profit() {
        let mut period = Period::open("June", day(1));
        period
            .record(EntryDraft::new_debit(day(2), "visa fees", dec!(1200)), Utc::now())
            .unwrap();
        period
            .record(EntryDraft::new_credit(day(3), "rent", dec!(450)), Utc::now())
            .unwrap();

        let summary = period.close(day(30)).expect("close active period");
        assert_eq!(summary.total_income, dec!(1200));
        assert_eq!(summary.total_expense, dec!(450));
        assert_eq!(summary.profit, summary.total_income - summary.total_expense);
        assert_eq!(period.status, PeriodStatus::Closed);
        assert_eq!(period.end_date, Some(day(30)));
        assert_eq!(period.entries.len(), 2, "entries stay archived");
    }

    #[test]
    fn closed_period_rejects_entries_and_second_close() {
        let mut period = Period::open("May", day(1));
        period.close(day(2)).unwrap();

        let err = period
            .record(EntryDraft::new_debit(day(3), "late", dec!(10)), Utc::now())
            .expect_err("closed period must not accept entries");
        assert_eq!(err, PeriodError::AlreadyClosed);
        assert!(period.entries.is_empty());
        assert_eq!(period.close(day(4)), Err(PeriodError::AlreadyClosed));
        assert_eq!(period.summary.unwrap().profit, Decimal::ZERO);
    }

    #[test]
    fn close_rejects_end_before_start() {
        let mut period = Period::open("July", day(10));
        assert_eq!(period.close(day(9)), Err(PeriodError::EndBeforeStart));
        assert!(period.is_active());
    }
}
