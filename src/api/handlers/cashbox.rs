use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use daftar_core::{CashboxBalance, CashboxHistory, CashboxService, ConvertedAmount};
use daftar_domain::DisplayOrder;

use crate::api::{extract::ApiQuery, AppState};

#[derive(Debug, Serialize)]
pub struct CashboxView {
    pub balances: Vec<CashboxLine>,
}

#[derive(Debug, Serialize)]
pub struct CashboxLine {
    #[serde(flatten)]
    pub balance: CashboxBalance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted: Option<ConvertedAmount>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub currency: Option<String>,
    #[serde(default)]
    pub order: DisplayOrder,
}

pub async fn get_cashbox(State(state): State<AppState>) -> Json<CashboxView> {
    let manager = state.manager.lock().await;
    let rate = state.display_rate.as_ref();
    let balances = CashboxService::balances(manager.book())
        .into_iter()
        .map(|balance| {
            let converted = (balance.currency != rate.currency)
                .then(|| rate.convert(balance.balance))
                .flatten()
                .map(|amount| ConvertedAmount {
                    currency: rate.currency.clone(),
                    amount,
                });
            CashboxLine { balance, converted }
        })
        .collect();
    Json(CashboxView { balances })
}

/// Running-balance history of one cashbox; the book's base currency by default.
pub async fn get_history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Json<CashboxHistory> {
    let manager = state.manager.lock().await;
    let book = manager.book();
    let currency = query
        .currency
        .filter(|code| !code.trim().is_empty())
        .unwrap_or_else(|| book.base_currency.clone());
    Json(CashboxService::history(book, &currency, query.order))
}
