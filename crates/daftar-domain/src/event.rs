//! Domain events that posting rules turn into ledger entries.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Services a travel agency buys from partner companies on a traveler's behalf.
pub enum ServiceKind {
    Hotel,
    Visa,
    Flight,
    Transport,
    Other,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceKind::Hotel => "Hotel",
            ServiceKind::Visa => "Visa",
            ServiceKind::Flight => "Flight",
            ServiceKind::Transport => "Transport",
            ServiceKind::Other => "Other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A service line on a traveler registration.
pub struct ServicePurchase {
    pub company_id: Uuid,
    pub service: ServiceKind,
    /// Nights for hotels, units otherwise.
    #[serde(default = "ServicePurchase::default_quantity")]
    pub quantity: u32,
    pub unit_cost: Decimal,
    /// Price charged to the traveler per unit. Defaults to `unit_cost`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServicePurchase {
    pub fn default_quantity() -> u32 {
        1
    }

    /// `unit_cost × quantity`, or `None` if it overflows.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.unit_cost.checked_mul(Decimal::from(self.quantity))
    }

    pub fn total_price(&self) -> Option<Decimal> {
        self.unit_price
            .unwrap_or(self.unit_cost)
            .checked_mul(Decimal::from(self.quantity))
    }

    pub fn label(&self) -> String {
        match &self.description {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ if self.quantity > 1 => format!("{} x{}", self.service, self.quantity),
            _ => self.service.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    ServicePurchased {
        traveler_id: Uuid,
        date: NaiveDate,
        purchase: ServicePurchase,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ServicePurchased { .. } => "ServicePurchased",
        }
    }
}
