//! Running-balance fold over debit/credit sequences.
//!
//! Entries are folded oldest-first in insertion order:
//! `balance[i] = balance[i - 1] + debit[i] - credit[i]`, starting from zero.
//! Presentation order is applied afterwards via [`DisplayOrder`], so a
//! newest-first view never changes the balances attached to each row.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::DisplayOrder,
    entry::{DebitCredit, LedgerEntry},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Sign classification of a balance. Negative balances are debt, the rest credit.
pub enum BalancePosition {
    Debt,
    Credit,
}

impl BalancePosition {
    pub fn of(balance: Decimal) -> Self {
        if balance < Decimal::ZERO {
            BalancePosition::Debt
        } else {
            BalancePosition::Credit
        }
    }
}

impl fmt::Display for BalancePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BalancePosition::Debt => "Debt",
            BalancePosition::Credit => "Credit",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Aggregated totals of a debit/credit sequence.
pub struct BalanceTotals {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub balance: Decimal,
}

impl BalanceTotals {
    pub fn of<T: DebitCredit>(items: &[T]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            acc.total_debit += item.debit();
            acc.total_credit += item.credit();
            acc.balance = acc.total_debit - acc.total_credit;
            acc
        })
    }

    pub fn position(&self) -> BalancePosition {
        BalancePosition::of(self.balance)
    }
}

/// Returns the running balance after each item, oldest-first.
pub fn running_balances<T: DebitCredit>(items: &[T]) -> Vec<Decimal> {
    items
        .iter()
        .scan(Decimal::ZERO, |balance, item| {
            *balance += item.debit() - item.credit();
            Some(*balance)
        })
        .collect()
}

/// Final balance of a sequence; zero for an empty sequence.
pub fn final_balance<T: DebitCredit>(items: &[T]) -> Decimal {
    running_balances(items)
        .last()
        .copied()
        .unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A ledger entry paired with the balance accumulated up to and including it.
pub struct StatementRow {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub position: BalancePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_id: Option<Uuid>,
}

/// Folds `entries` oldest-first and returns rows in the requested display order.
pub fn statement_rows(entries: &[LedgerEntry], order: DisplayOrder) -> Vec<StatementRow> {
    let mut rows: Vec<StatementRow> = entries
        .iter()
        .zip(running_balances(entries))
        .map(|(entry, balance)| StatementRow {
            entry_id: entry.id,
            date: entry.date,
            description: entry.description.clone(),
            debit: entry.debit,
            credit: entry.credit,
            balance,
            position: BalancePosition::of(balance),
            posting_id: entry.posting_id,
        })
        .collect();
    if order == DisplayOrder::NewestFirst {
        rows.reverse();
    }
    rows
}
