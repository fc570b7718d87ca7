//! Traveler registration: opens the traveler's ledger and posts every
//! purchased service against the supplying company.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use daftar_domain::{AccountKind, Book, DomainEvent, ServicePurchase};

use crate::{
    account_service::{AccountService, NewAccount},
    posting_service::{PostingReceipt, PostingService},
    time::Clock,
    CoreError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTraveler {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub passport: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub purchases: Vec<ServicePurchase>,
    /// Date the purchases are booked on; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelerRegistration {
    pub traveler_id: Uuid,
    pub postings: Vec<PostingReceipt>,
}

pub struct TravelerService;

impl TravelerService {
    /// Registers a traveler and books each purchase. Callers wanting
    /// all-or-nothing semantics run this inside `BookManager::transact`.
    pub fn register(
        book: &mut Book,
        request: NewTraveler,
        clock: &dyn Clock,
    ) -> Result<TravelerRegistration, CoreError> {
        let traveler_id = AccountService::open(
            book,
            AccountKind::Traveler,
            NewAccount {
                name: request.name,
                code: request.code,
                currency: request.currency,
                phone: request.phone,
                notes: request.passport.map(|passport| format!("Passport: {passport}")),
            },
        )?;
        let date = request.date.unwrap_or_else(|| clock.today());
        let mut postings = Vec::with_capacity(request.purchases.len());
        for purchase in request.purchases {
            postings.push(Self::add_purchase(book, traveler_id, date, purchase, clock)?);
        }
        info!(%traveler_id, services = postings.len(), "traveler registered");
        Ok(TravelerRegistration {
            traveler_id,
            postings,
        })
    }

    pub fn add_purchase(
        book: &mut Book,
        traveler_id: Uuid,
        date: NaiveDate,
        purchase: ServicePurchase,
        clock: &dyn Clock,
    ) -> Result<PostingReceipt, CoreError> {
        let event = DomainEvent::ServicePurchased {
            traveler_id,
            date,
            purchase,
        };
        PostingService::publish(book, &event, clock)
    }
}
