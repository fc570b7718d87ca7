use axum::{extract::State, http::StatusCode, Json};

use daftar_core::{CashboxService, NewAdjustment, NewTransaction};
use daftar_domain::{BalanceAdjustment, Transaction};

use crate::{
    api::{extract::ApiJson, AppState},
    errors::ApiResult,
};

pub async fn list_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    let manager = state.manager.lock().await;
    Json(
        CashboxService::transactions(manager.book())
            .into_iter()
            .cloned()
            .collect(),
    )
}

pub async fn today_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    let manager = state.manager.lock().await;
    Json(
        CashboxService::transactions_today(manager.book(), manager.clock())
            .into_iter()
            .cloned()
            .collect(),
    )
}

/// Records a receipt or payment; payments larger than the cashbox balance get a 400.
pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let mut manager = state.manager.lock().await;
    let transaction =
        manager.transact(|book, clock| CashboxService::record(book, payload, clock))?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn create_adjustment(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAdjustment>,
) -> ApiResult<(StatusCode, Json<BalanceAdjustment>)> {
    let mut manager = state.manager.lock().await;
    let adjustment =
        manager.transact(|book, clock| CashboxService::adjust(book, payload, clock))?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}
