use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use daftar_core::{AccountService, AccountStatement, AccountSummary, LedgerService, NewAccount};
use daftar_domain::AccountKind;

use super::OrderQuery;
use crate::{
    api::{
        extract::{ApiJson, ApiPath, ApiQuery},
        AppState,
    },
    errors::ApiResult,
};

pub async fn list_customers(State(state): State<AppState>) -> Json<Vec<AccountSummary>> {
    list_of(&state, AccountKind::Customer).await
}

pub async fn create_customer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAccount>,
) -> ApiResult<(StatusCode, Json<AccountSummary>)> {
    open_of(&state, AccountKind::Customer, payload).await
}

pub async fn customer_ledger(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> ApiResult<Json<AccountStatement>> {
    ledger_of(&state, AccountKind::Customer, id, query).await
}

pub async fn list_companies(State(state): State<AppState>) -> Json<Vec<AccountSummary>> {
    list_of(&state, AccountKind::Company).await
}

pub async fn create_company(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAccount>,
) -> ApiResult<(StatusCode, Json<AccountSummary>)> {
    open_of(&state, AccountKind::Company, payload).await
}

pub async fn company_ledger(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> ApiResult<Json<AccountStatement>> {
    ledger_of(&state, AccountKind::Company, id, query).await
}

/// Deletes a customer, company, or traveler with its whole ledger.
pub async fn delete_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut manager = state.manager.lock().await;
    manager.transact(|book, _| AccountService::remove(book, id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_of(state: &AppState, kind: AccountKind) -> Json<Vec<AccountSummary>> {
    let manager = state.manager.lock().await;
    Json(LedgerService::summaries(manager.book(), kind))
}

async fn open_of(
    state: &AppState,
    kind: AccountKind,
    payload: NewAccount,
) -> ApiResult<(StatusCode, Json<AccountSummary>)> {
    let mut manager = state.manager.lock().await;
    let id = manager.transact(|book, _| AccountService::open(book, kind, payload))?;
    let account = AccountService::get(manager.book(), id)?;
    Ok((StatusCode::CREATED, Json(AccountSummary::from(account))))
}

pub(crate) async fn ledger_of(
    state: &AppState,
    kind: AccountKind,
    id: Uuid,
    query: OrderQuery,
) -> ApiResult<Json<AccountStatement>> {
    let manager = state.manager.lock().await;
    let account = AccountService::get_of_kind(manager.book(), id, kind)?;
    Ok(Json(LedgerService::statement_for(
        account,
        query.order,
        Some(state.display_rate.as_ref()),
    )))
}
