//! Read-side helpers: account statements and balance listings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use daftar_domain::{
    Account, AccountKind, BalancePosition, BalanceTotals, Book, DisplayOrder, DisplayRate,
    StatementRow,
};

use crate::{account_service::AccountService, CoreError};

/// A balance expressed in a display-only currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvertedAmount {
    pub currency: String,
    pub amount: Decimal,
}

/// An account's ledger with running balances and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatement {
    pub account_id: Uuid,
    pub kind: AccountKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub currency: String,
    pub order: DisplayOrder,
    pub rows: Vec<StatementRow>,
    pub totals: BalanceTotals,
    pub position: BalancePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_balance: Option<ConvertedAmount>,
}

/// One line of an account listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub kind: AccountKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub currency: String,
    pub balance: Decimal,
    pub position: BalancePosition,
    pub entry_count: usize,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        let balance = account.balance();
        Self {
            id: account.id,
            kind: account.kind,
            name: account.name.clone(),
            code: account.code.clone(),
            currency: account.currency.clone(),
            balance,
            position: BalancePosition::of(balance),
            entry_count: account.entries.len(),
        }
    }
}

pub struct LedgerService;

impl LedgerService {
    /// Builds the statement of a single account.
    ///
    /// `rate` is applied only when the account is kept in a different currency
    /// than the rate's target.
    pub fn statement(
        book: &Book,
        account_id: Uuid,
        order: DisplayOrder,
        rate: Option<&DisplayRate>,
    ) -> Result<AccountStatement, CoreError> {
        let account = AccountService::get(book, account_id)?;
        Ok(Self::statement_for(account, order, rate))
    }

    pub fn statement_for(
        account: &Account,
        order: DisplayOrder,
        rate: Option<&DisplayRate>,
    ) -> AccountStatement {
        let totals = account.totals();
        let converted_balance = rate
            .filter(|rate| rate.currency != account.currency)
            .and_then(|rate| {
                rate.convert(totals.balance).map(|amount| ConvertedAmount {
                    currency: rate.currency.clone(),
                    amount,
                })
            });
        AccountStatement {
            account_id: account.id,
            kind: account.kind,
            name: account.name.clone(),
            code: account.code.clone(),
            currency: account.currency.clone(),
            order,
            rows: account.statement(order),
            totals,
            position: totals.position(),
            converted_balance,
        }
    }

    pub fn balance(book: &Book, account_id: Uuid) -> Result<Decimal, CoreError> {
        AccountService::get(book, account_id).map(Account::balance)
    }

    pub fn summaries(book: &Book, kind: AccountKind) -> Vec<AccountSummary> {
        book.accounts_of(kind).map(AccountSummary::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use daftar_domain::EntryDraft;
    use rust_decimal_macros::dec;

    use crate::account_service::NewAccount;

    #[test]
    fn statement_reports_rows_totals_and_conversion() {
        let mut book = Book::new("Agency", "USD");
        let id = AccountService::open(
            &mut book,
            AccountKind::Customer,
            NewAccount::named("Omar"),
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        book.append_entry(id, EntryDraft::new_debit(date, "package", dec!(5000)), None, Utc::now());
        book.append_entry(id, EntryDraft::new_credit(date, "deposit", dec!(400)), None, Utc::now());

        let rate = DisplayRate::sar();
        let statement =
            LedgerService::statement(&book, id, DisplayOrder::OldestFirst, Some(&rate)).unwrap();
        let balances: Vec<_> = statement.rows.iter().map(|row| row.balance).collect();
        assert_eq!(balances, vec![dec!(5000), dec!(4600)]);
        assert_eq!(statement.totals.balance, dec!(4600));
        assert_eq!(statement.position, BalancePosition::Credit);
        assert_eq!(
            statement.converted_balance,
            Some(ConvertedAmount {
                currency: "SAR".into(),
                amount: dec!(17250.00),
            })
        );
    }

    #[test]
    fn statement_for_unknown_account_fails() {
        let book = Book::new("Agency", "USD");
        let err = LedgerService::statement(&book, Uuid::new_v4(), DisplayOrder::NewestFirst, None)
            .expect_err("unknown account");
        assert!(matches!(err, CoreError::AccountNotFound(_)));
    }
}
