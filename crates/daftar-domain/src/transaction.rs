//! Cashbox movements and manual balance adjustments.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Direction of a cashbox movement.
pub enum TransactionKind {
    /// Cash received: cashbox debit, counterparty credit.
    Receipt,
    /// Cash paid out: cashbox credit, counterparty debit.
    Payment,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Receipt => "Receipt",
            TransactionKind::Payment => "Payment",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    pub currency: String,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub posting_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("txn:{} [{} {} {}]", self.id, self.kind, self.amount, self.currency)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Records a manual correction of a cashbox balance.
pub struct BalanceAdjustment {
    pub id: Uuid,
    pub currency: String,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub reason: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl BalanceAdjustment {
    pub fn difference(&self) -> Decimal {
        self.new_balance - self.previous_balance
    }
}

impl Identifiable for BalanceAdjustment {
    fn id(&self) -> Uuid {
        self.id
    }
}
