//! Cashbox movements (receipts/payments), balance adjustments, and history.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use daftar_domain::{
    normalize_currency, AccountKind, BalanceAdjustment, BalancePosition, Book, DisplayOrder,
    EntryDraft, StatementRow, Transaction, TransactionKind,
};

use crate::{
    account_service::AccountService,
    posting_service::{Posting, PostingLeg, PostingReceipt, PostingService},
    time::Clock,
    CoreError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub currency: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    /// Defaults to the clock's today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdjustment {
    #[serde(default)]
    pub currency: Option<String>,
    pub new_balance: Decimal,
    pub reason: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashboxBalance {
    pub currency: String,
    pub balance: Decimal,
    pub position: BalancePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashboxHistory {
    pub currency: String,
    pub balance: Decimal,
    pub order: DisplayOrder,
    pub rows: Vec<StatementRow>,
    pub adjustments: Vec<BalanceAdjustment>,
}

pub struct CashboxService;

impl CashboxService {
    pub fn balance(book: &Book, currency: &str) -> Decimal {
        book.cashbox_balance(currency)
    }

    pub fn balances(book: &Book) -> Vec<CashboxBalance> {
        let mut balances: Vec<CashboxBalance> = book
            .accounts_of(AccountKind::Cashbox)
            .map(|cashbox| {
                let balance = cashbox.balance();
                CashboxBalance {
                    currency: cashbox.currency.clone(),
                    balance,
                    position: BalancePosition::of(balance),
                }
            })
            .collect();
        balances.sort_by(|a, b| a.currency.cmp(&b.currency));
        balances
    }

    /// Running-balance history of one cashbox; empty when it was never used.
    pub fn history(book: &Book, currency: &str, order: DisplayOrder) -> CashboxHistory {
        let currency = normalize_currency(currency);
        let (balance, rows) = match book.cashbox(&currency) {
            Some(cashbox) => (cashbox.balance(), cashbox.statement(order)),
            None => (Decimal::ZERO, Vec::new()),
        };
        let mut adjustments: Vec<BalanceAdjustment> = book
            .adjustments
            .iter()
            .filter(|adjustment| adjustment.currency == currency)
            .cloned()
            .collect();
        if order == DisplayOrder::NewestFirst {
            adjustments.reverse();
        }
        CashboxHistory {
            currency,
            balance,
            order,
            rows,
            adjustments,
        }
    }

    /// Records a receipt or payment against the cashbox and, when given, the
    /// customer's ledger. A payment larger than the cashbox balance is refused.
    pub fn record(
        book: &mut Book,
        request: NewTransaction,
        clock: &dyn Clock,
    ) -> Result<Transaction, CoreError> {
        if request.amount <= Decimal::ZERO {
            return Err(CoreError::Validation("amount must be greater than zero".into()));
        }
        let currency = Self::resolve_currency(book, request.currency.as_deref());
        if let Some(customer_id) = request.customer_id {
            let customer = AccountService::get_of_kind(book, customer_id, AccountKind::Customer)?;
            if customer.currency != currency {
                return Err(CoreError::Validation(format!(
                    "customer ledger is kept in {}, not {}",
                    customer.currency, currency
                )));
            }
        }
        let date = request.date.unwrap_or_else(|| clock.today());
        let description = if request.description.trim().is_empty() {
            request.kind.to_string()
        } else {
            request.description.trim().to_string()
        };

        let (cashbox_draft, customer_draft) = match request.kind {
            TransactionKind::Receipt => (
                EntryDraft::new_debit(date, description.clone(), request.amount),
                EntryDraft::new_credit(date, description.clone(), request.amount),
            ),
            TransactionKind::Payment => (
                EntryDraft::new_credit(date, description.clone(), request.amount),
                EntryDraft::new_debit(date, description.clone(), request.amount),
            ),
        };
        let customer_leg = request
            .customer_id
            .map(|customer_id| PostingLeg::new(customer_id, customer_draft));
        let receipt = Self::post_to_cashbox(
            book,
            &currency,
            |cashbox_id| {
                let posting = Posting::single(cashbox_id, cashbox_draft);
                match customer_leg {
                    Some(leg) => posting.with_leg(leg),
                    None => posting,
                }
            },
            clock,
        )?;

        let transaction = Transaction {
            id: Uuid::new_v4(),
            kind: request.kind,
            customer_id: request.customer_id,
            currency,
            amount: request.amount,
            description,
            date,
            posting_id: receipt.posting_id,
            created_at: clock.now(),
        };
        book.add_transaction(transaction.clone());
        info!(
            id = %transaction.id,
            kind = %transaction.kind,
            amount = %transaction.amount,
            currency = %transaction.currency,
            "cashbox transaction recorded"
        );
        Ok(transaction)
    }

    /// Sets a cashbox to `new_balance` by posting the difference as one entry.
    pub fn adjust(
        book: &mut Book,
        request: NewAdjustment,
        clock: &dyn Clock,
    ) -> Result<BalanceAdjustment, CoreError> {
        if request.new_balance < Decimal::ZERO {
            return Err(CoreError::Validation("cashbox balance cannot be negative".into()));
        }
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation("adjustment reason is required".into()));
        }
        let currency = Self::resolve_currency(book, request.currency.as_deref());
        let date = request.date.unwrap_or_else(|| clock.today());
        let previous_balance = book.cashbox_balance(&currency);
        let difference = request.new_balance - previous_balance;
        let description = format!("Adjustment: {reason}");
        let draft = if difference > Decimal::ZERO {
            Some(EntryDraft::new_debit(date, description, difference))
        } else if difference < Decimal::ZERO {
            Some(EntryDraft::new_credit(date, description, -difference))
        } else {
            None
        };
        match draft {
            Some(draft) => {
                Self::post_to_cashbox(book, &currency, |id| Posting::single(id, draft), clock)?;
            }
            None => {
                book.ensure_cashbox(&currency);
            }
        }

        let adjustment = BalanceAdjustment {
            id: Uuid::new_v4(),
            currency,
            previous_balance,
            new_balance: request.new_balance,
            reason: reason.to_string(),
            date,
            created_at: clock.now(),
        };
        book.add_adjustment(adjustment.clone());
        info!(
            currency = %adjustment.currency,
            from = %previous_balance,
            to = %adjustment.new_balance,
            "cashbox adjusted"
        );
        Ok(adjustment)
    }

    /// All transactions, newest first.
    pub fn transactions(book: &Book) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = book.transactions.iter().collect();
        transactions.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        transactions
    }

    pub fn transactions_on(book: &Book, date: NaiveDate) -> Vec<&Transaction> {
        Self::transactions(book)
            .into_iter()
            .filter(|txn| txn.date == date)
            .collect()
    }

    pub fn transactions_today<'a>(book: &'a Book, clock: &dyn Clock) -> Vec<&'a Transaction> {
        Self::transactions_on(book, clock.today())
    }

    /// Posts against the `currency` cashbox. A cashbox opened for this posting
    /// is removed again when the posting is refused.
    fn post_to_cashbox(
        book: &mut Book,
        currency: &str,
        build: impl FnOnce(Uuid) -> Posting,
        clock: &dyn Clock,
    ) -> Result<PostingReceipt, CoreError> {
        if let Some(cashbox_id) = book.cashbox(currency).map(|account| account.id) {
            return PostingService::post(book, build(cashbox_id), clock);
        }
        let cashbox_id = book.ensure_cashbox(currency);
        let result = PostingService::post(book, build(cashbox_id), clock);
        if result.is_err() {
            book.remove_account(cashbox_id);
        }
        result
    }

    fn resolve_currency(book: &Book, requested: Option<&str>) -> String {
        requested
            .map(normalize_currency)
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| book.base_currency.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::{account_service::NewAccount, time::FixedClock};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn receipt(amount: Decimal, customer_id: Option<Uuid>) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Receipt,
            customer_id,
            currency: None,
            amount,
            description: String::new(),
            date: None,
        }
    }

    fn payment(amount: Decimal, customer_id: Option<Uuid>) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Payment,
            ..receipt(amount, customer_id)
        }
    }

    #[test]
    fn receipt_credits_customer_and_fills_cashbox() {
        let clock = FixedClock::on(day(5));
        let mut book = Book::new("Clinic", "USD");
        let customer = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("Sara"),
        )
        .unwrap();

        let txn = CashboxService::record(
            &mut book,
            receipt(dec!(250), Some(customer)),
            &clock,
        )
        .unwrap();

        assert_eq!(txn.date, day(5));
        assert_eq!(txn.description, "Receipt");
        assert_eq!(CashboxService::balance(&book, "USD"), dec!(250));
        assert_eq!(book.account(customer).unwrap().balance(), dec!(-250));
        assert_eq!(book.entries_for_posting(txn.posting_id).len(), 2);
    }

    #[test]
    fn overdrawing_payment_is_rejected_without_mutation() {
        let clock = FixedClock::on(day(5));
        let mut book = Book::new("Clinic", "USD");
        CashboxService::record(&mut book, receipt(dec!(100), None), &clock).unwrap();
        let before = book.clone();

        let err = CashboxService::record(&mut book, payment(dec!(150), None), &clock)
            .expect_err("withdrawal larger than balance");

        assert!(matches!(err, CoreError::InsufficientFunds { .. }));
        assert_eq!(CashboxService::balance(&book, "USD"), dec!(100));
        assert_eq!(book.transactions.len(), before.transactions.len());
        assert_eq!(book.accounts, before.accounts);
    }

    #[test]
    fn refused_payment_does_not_open_a_cashbox() {
        let clock = FixedClock::on(day(5));
        let mut book = Book::new("Clinic", "USD");
        let request = NewTransaction {
            currency: Some("eur".into()),
            ..payment(dec!(40), None)
        };

        let err = CashboxService::record(&mut book, request, &clock).expect_err("no EUR funds");

        assert!(matches!(
            err,
            CoreError::InsufficientFunds { ref currency, .. } if currency == "EUR",
        ));
        assert!(book.cashbox("EUR").is_none());
        assert!(book.accounts.is_empty());
    }

    #[test]
    fn receipts_that_overflow_the_cashbox_are_refused() {
        let clock = FixedClock::on(day(5));
        let mut book = Book::new("Clinic", "USD");
        let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        CashboxService::record(&mut book, receipt(huge, None), &clock).unwrap();

        let err = CashboxService::record(&mut book, receipt(huge, None), &clock)
            .expect_err("total past decimal range");

        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(CashboxService::balance(&book, "USD"), huge);
        assert_eq!(book.transactions.len(), 1);
    }

    #[test]
    fn payment_up_to_balance_is_allowed() {
        let clock = FixedClock::on(day(5));
        let mut book = Book::new("Clinic", "USD");
        CashboxService::record(&mut book, receipt(dec!(100), None), &clock).unwrap();
        CashboxService::record(&mut book, payment(dec!(100), None), &clock).unwrap();
        assert_eq!(CashboxService::balance(&book, "USD"), Decimal::ZERO);
    }

    #[test]
    fn zero_amounts_and_currency_mismatch_are_refused() {
        let clock = FixedClock::on(day(5));
        let mut book = Book::new("Clinic", "USD");
        let customer = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("Reza"),
        )
        .unwrap();
        assert!(matches!(
            CashboxService::record(&mut book, receipt(Decimal::ZERO, None), &clock),
            Err(CoreError::Validation(_))
        ));
        let mut in_sar = receipt(dec!(10), Some(customer));
        in_sar.currency = Some("sar".into());
        assert!(matches!(
            CashboxService::record(&mut book, in_sar, &clock),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn adjustment_posts_difference_and_is_listed_in_history() {
        let clock = FixedClock::on(day(9));
        let mut book = Book::new("Agency", "USD");
        CashboxService::record(&mut book, receipt(dec!(300), None), &clock).unwrap();

        let adjustment = CashboxService::adjust(
            &mut book,
            NewAdjustment {
                currency: None,
                new_balance: dec!(275),
                reason: "counted till".into(),
                date: None,
            },
            &clock,
        )
        .unwrap();

        assert_eq!(adjustment.previous_balance, dec!(300));
        assert_eq!(adjustment.difference(), dec!(-25));
        let history = CashboxService::history(&book, "usd", DisplayOrder::NewestFirst);
        assert_eq!(history.balance, dec!(275));
        assert_eq!(history.rows[0].credit, dec!(25));
        assert_eq!(history.rows[0].balance, dec!(275));
        assert_eq!(history.adjustments.len(), 1);
    }

    #[test]
    fn negative_adjustment_target_is_refused() {
        let clock = FixedClock::on(day(9));
        let mut book = Book::new("Agency", "USD");
        let err = CashboxService::adjust(
            &mut book,
            NewAdjustment {
                currency: None,
                new_balance: dec!(-1),
                reason: "oops".into(),
                date: None,
            },
            &clock,
        )
        .expect_err("negative target");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(book.adjustments.is_empty());
    }

    #[test]
    fn today_lists_only_current_date() {
        let mut book = Book::new("Agency", "USD");
        let yesterday = FixedClock::on(day(1));
        let today = FixedClock::on(day(2));
        CashboxService::record(&mut book, receipt(dec!(5), None), &yesterday).unwrap();
        CashboxService::record(&mut book, receipt(dec!(7), None), &today).unwrap();

        let todays = CashboxService::transactions_today(&book, &today);
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].amount, dec!(7));
        assert_eq!(CashboxService::transactions(&book)[0].amount, dec!(7));
    }

    #[test]
    fn balances_list_every_cashbox() {
        let clock = FixedClock::on(day(3));
        let mut book = Book::new("Agency", "USD");
        CashboxService::record(&mut book, receipt(dec!(5), None), &clock).unwrap();
        let mut sar = receipt(dec!(40), None);
        sar.currency = Some("SAR".into());
        CashboxService::record(&mut book, sar, &clock).unwrap();

        let balances = CashboxService::balances(&book);
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].currency, "SAR");
        assert_eq!(balances[0].balance, dec!(40));
    }
}
