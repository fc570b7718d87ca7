//! Multi-account postings and the rules that derive them from domain events.
//!
//! A posting is validated as a whole before any leg is written, so either every
//! leg lands under the same `posting_id` or none does.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use daftar_domain::{AccountKind, BalanceTotals, Book, DomainEvent, EntryDraft, NamedEntity};

use crate::{account_service::AccountService, time::Clock, CoreError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostingLeg {
    pub account_id: Uuid,
    #[serde(flatten)]
    pub draft: EntryDraft,
}

impl PostingLeg {
    pub fn new(account_id: Uuid, draft: EntryDraft) -> Self {
        Self { account_id, draft }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Posting {
    pub legs: Vec<PostingLeg>,
}

impl Posting {
    pub fn single(account_id: Uuid, draft: EntryDraft) -> Self {
        Self {
            legs: vec![PostingLeg::new(account_id, draft)],
        }
    }

    /// A primary leg plus the linked entry on a second account.
    pub fn mirrored(primary: PostingLeg, mirror: PostingLeg) -> Self {
        Self {
            legs: vec![primary, mirror],
        }
    }

    pub fn with_leg(mut self, leg: PostingLeg) -> Self {
        self.legs.push(leg);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostingReceipt {
    pub posting_id: Uuid,
    pub entry_ids: Vec<Uuid>,
}

/// Derives the posting a domain event implies.
pub trait PostingRule: Send + Sync {
    fn handles(&self, event: &DomainEvent) -> bool;
    fn derive(&self, book: &Book, event: &DomainEvent) -> Result<Posting, CoreError>;
}

/// `ServicePurchased` → debit the partner company with the cost (we owe them)
/// and debit the traveler with the sale price (they owe us).
pub struct ServicePurchaseRule;

impl PostingRule for ServicePurchaseRule {
    fn handles(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::ServicePurchased { .. })
    }

    fn derive(&self, book: &Book, event: &DomainEvent) -> Result<Posting, CoreError> {
        let DomainEvent::ServicePurchased {
            traveler_id,
            date,
            purchase,
        } = event;
        let traveler = AccountService::get_of_kind(book, *traveler_id, AccountKind::Traveler)?;
        let company = AccountService::get_of_kind(book, purchase.company_id, AccountKind::Company)?;
        if purchase.quantity == 0 {
            return Err(CoreError::Validation("service quantity must be at least 1".into()));
        }
        if purchase.unit_cost < Decimal::ZERO
            || purchase.unit_price.is_some_and(|price| price < Decimal::ZERO)
        {
            return Err(CoreError::Validation("service amounts must not be negative".into()));
        }
        if traveler.currency != company.currency {
            return Err(CoreError::Validation(format!(
                "traveler ledger is kept in {} but {} bills in {}",
                traveler.currency,
                company.name(),
                company.currency
            )));
        }
        let overflow = || CoreError::Validation("service total is too large".into());
        let cost = purchase.total_cost().ok_or_else(overflow)?;
        let price = purchase.total_price().ok_or_else(overflow)?;
        let label = purchase.label();
        Ok(Posting::mirrored(
            PostingLeg::new(
                company.id,
                EntryDraft::new_debit(
                    *date,
                    format!("{label} for {}", traveler.name()),
                    cost,
                ),
            ),
            PostingLeg::new(
                traveler.id,
                EntryDraft::new_debit(
                    *date,
                    format!("{label} via {}", company.name()),
                    price,
                ),
            ),
        ))
    }
}

pub struct PostingService;

impl PostingService {
    /// Validates every leg, then appends them all under one posting id.
    pub fn post(
        book: &mut Book,
        posting: Posting,
        clock: &dyn Clock,
    ) -> Result<PostingReceipt, CoreError> {
        Self::validate(book, &posting)?;
        let posting_id = Uuid::new_v4();
        let created_at = clock.now();
        let mut entry_ids = Vec::with_capacity(posting.legs.len());
        for leg in posting.legs {
            let id = book
                .append_entry(leg.account_id, leg.draft, Some(posting_id), created_at)
                .ok_or(CoreError::AccountNotFound(leg.account_id))?;
            entry_ids.push(id);
        }
        debug!(%posting_id, legs = entry_ids.len(), "posting applied");
        Ok(PostingReceipt {
            posting_id,
            entry_ids,
        })
    }

    /// Runs `event` through the built-in rules and applies the derived posting.
    pub fn publish(
        book: &mut Book,
        event: &DomainEvent,
        clock: &dyn Clock,
    ) -> Result<PostingReceipt, CoreError> {
        let rules = Self::default_rules();
        Self::publish_with(book, event, &rules, clock)
    }

    pub fn publish_with(
        book: &mut Book,
        event: &DomainEvent,
        rules: &[Box<dyn PostingRule>],
        clock: &dyn Clock,
    ) -> Result<PostingReceipt, CoreError> {
        let rule = rules
            .iter()
            .find(|rule| rule.handles(event))
            .ok_or_else(|| {
                CoreError::InvalidOperation(format!("no posting rule handles {}", event.name()))
            })?;
        let posting = rule.derive(book, event)?;
        debug!(event = event.name(), "posting derived from event");
        Self::post(book, posting, clock)
    }

    pub fn default_rules() -> Vec<Box<dyn PostingRule>> {
        vec![Box::new(ServicePurchaseRule)]
    }

    fn validate(book: &Book, posting: &Posting) -> Result<(), CoreError> {
        if posting.legs.is_empty() {
            return Err(CoreError::Validation("posting has no legs".into()));
        }
        // Per-account debit and credit totals with this posting applied.
        let mut projected: HashMap<Uuid, BalanceTotals> = HashMap::new();
        for leg in &posting.legs {
            let account = AccountService::get(book, leg.account_id)?;
            if leg.draft.has_negative_side() {
                return Err(CoreError::Validation(
                    "debit and credit must not be negative".into(),
                ));
            }
            let totals = projected
                .entry(account.id)
                .or_insert_with(|| account.totals());
            let overflow = || {
                CoreError::Validation(format!(
                    "amount is too large for the ledger of {}",
                    account.name()
                ))
            };
            totals.total_debit = totals
                .total_debit
                .checked_add(leg.draft.debit)
                .ok_or_else(overflow)?;
            totals.total_credit = totals
                .total_credit
                .checked_add(leg.draft.credit)
                .ok_or_else(overflow)?;
        }
        for (account_id, after) in projected {
            let account = AccountService::get(book, account_id)?;
            if account.kind != AccountKind::Cashbox {
                continue;
            }
            let balance = account.balance();
            let remaining = after.total_debit - after.total_credit;
            if remaining < Decimal::ZERO && remaining < balance {
                let requested = balance - remaining;
                warn!(
                    currency = %account.currency,
                    %balance,
                    %requested,
                    "cashbox withdrawal refused"
                );
                return Err(CoreError::InsufficientFunds {
                    currency: account.currency.clone(),
                    balance,
                    requested,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use daftar_domain::{ServiceKind, ServicePurchase};
    use rust_decimal_macros::dec;

    use crate::{account_service::NewAccount, time::FixedClock};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::on(date())
    }

    #[test]
    fn mirrored_posting_shares_posting_id() {
        let mut book = Book::new("Agency", "USD");
        let customer = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("A"),
        )
        .unwrap();
        let company = AccountService::open(
            &mut book,
            AccountKind::Company,
            NewAccount::named("B"),
        )
        .unwrap();

        let receipt = PostingService::post(
            &mut book,
            Posting::mirrored(
                PostingLeg::new(customer, EntryDraft::new_debit(date(), "charge", dec!(10))),
                PostingLeg::new(company, EntryDraft::new_debit(date(), "cost", dec!(7))),
            ),
            &clock(),
        )
        .unwrap();

        assert_eq!(receipt.entry_ids.len(), 2);
        let linked = book.entries_for_posting(receipt.posting_id);
        assert_eq!(linked.len(), 2);
    }

    #[test]
    fn failing_leg_aborts_whole_posting() {
        let mut book = Book::new("Agency", "USD");
        let customer = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("A"),
        )
        .unwrap();

        let err = PostingService::post(
            &mut book,
            Posting::single(customer, EntryDraft::new_debit(date(), "ok", dec!(10)))
                .with_leg(PostingLeg::new(
                    Uuid::new_v4(),
                    EntryDraft::new_debit(date(), "ghost", dec!(1)),
                )),
            &clock(),
        )
        .expect_err("unknown account leg");

        assert!(matches!(err, CoreError::AccountNotFound(_)));
        assert!(book.account(customer).unwrap().entries.is_empty());
    }

    #[test]
    fn cashbox_cannot_go_negative() {
        let mut book = Book::new("Agency", "USD");
        let cashbox = book.ensure_cashbox("USD");
        PostingService::post(
            &mut book,
            Posting::single(cashbox, EntryDraft::new_debit(date(), "opening", dec!(100))),
            &clock(),
        )
        .unwrap();

        let err = PostingService::post(
            &mut book,
            Posting::single(cashbox, EntryDraft::new_credit(date(), "withdrawal", dec!(150))),
            &clock(),
        )
        .expect_err("overdraw");
        assert!(matches!(
            err,
            CoreError::InsufficientFunds { ref currency, balance, requested }
                if currency == "USD" && balance == dec!(100) && requested == dec!(150)
        ));
        assert_eq!(book.cashbox_balance("USD"), dec!(100));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut book = Book::new("Agency", "USD");
        let customer = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("A"),
        )
        .unwrap();
        let err = PostingService::post(
            &mut book,
            Posting::single(customer, EntryDraft::new_debit(date(), "refund?", dec!(-5))),
            &clock(),
        )
        .expect_err("negative debit");
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn service_purchase_debits_company_and_traveler() {
        let mut book = Book::new("Agency", "USD");
        let company = AccountService::open(
            &mut book,
            AccountKind::Company,
            NewAccount::named("X"),
        )
        .unwrap();
        let traveler = AccountService::open(
            &mut book,
            AccountKind::Traveler,
            NewAccount::named("Hajji"),
        )
        .unwrap();
        let event = DomainEvent::ServicePurchased {
            traveler_id: traveler,
            date: date(),
            purchase: ServicePurchase {
                company_id: company,
                service: ServiceKind::Hotel,
                quantity: 5,
                unit_cost: dec!(80),
                unit_price: Some(dec!(95)),
                description: None,
            },
        };

        PostingService::publish(&mut book, &event, &clock()).unwrap();

        let company_account = book.account(company).unwrap();
        assert_eq!(company_account.entries.len(), 1);
        assert_eq!(company_account.entries[0].debit, dec!(400));
        assert_eq!(company_account.balance(), dec!(400));
        assert_eq!(book.account(traveler).unwrap().balance(), dec!(475));
    }

    #[test]
    fn service_purchase_past_decimal_range_is_refused() {
        let mut book = Book::new("Agency", "USD");
        let company = AccountService::open(
            &mut book,
            AccountKind::Company,
            NewAccount::named("X"),
        )
        .unwrap();
        let traveler = AccountService::open(
            &mut book,
            AccountKind::Traveler,
            NewAccount::named("Hajji"),
        )
        .unwrap();
        let event = DomainEvent::ServicePurchased {
            traveler_id: traveler,
            date: date(),
            purchase: ServicePurchase {
                company_id: company,
                service: ServiceKind::Hotel,
                quantity: 3,
                unit_cost: Decimal::MAX,
                unit_price: None,
                description: None,
            },
        };

        let err = PostingService::publish(&mut book, &event, &clock()).expect_err("overflow");

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(book.account(company).unwrap().entries.is_empty());
    }

    #[test]
    fn service_purchase_requires_company_account() {
        let mut book = Book::new("Agency", "USD");
        let not_company = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("X"),
        )
        .unwrap();
        let traveler = AccountService::open(
            &mut book,
            AccountKind::Traveler,
            NewAccount::named("Hajji"),
        )
        .unwrap();
        let event = DomainEvent::ServicePurchased {
            traveler_id: traveler,
            date: date(),
            purchase: ServicePurchase {
                company_id: not_company,
                service: ServiceKind::Visa,
                quantity: 1,
                unit_cost: dec!(100),
                unit_price: None,
                description: None,
            },
        };
        let err = PostingService::publish(&mut book, &event, &clock()).expect_err("wrong kind");
        assert!(matches!(err, CoreError::AccountNotFound(id) if id == not_company));
        assert!(book.account(traveler).unwrap().entries.is_empty());
    }

    #[test]
    fn events_without_rules_are_refused() {
        let mut book = Book::new("Agency", "USD");
        let event = DomainEvent::ServicePurchased {
            traveler_id: Uuid::new_v4(),
            date: date(),
            purchase: ServicePurchase {
                company_id: Uuid::new_v4(),
                service: ServiceKind::Other,
                quantity: 1,
                unit_cost: dec!(1),
                unit_price: None,
                description: None,
            },
        };
        let err = PostingService::publish_with(&mut book, &event, &[], &clock())
            .expect_err("no rules");
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }
}
