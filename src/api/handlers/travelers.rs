use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use daftar_core::{
    AccountStatement, AccountSummary, NewTraveler, TravelerRegistration, TravelerService,
};
use daftar_domain::AccountKind;

use super::{
    accounts::{ledger_of, list_of},
    OrderQuery,
};
use crate::{
    api::{
        extract::{ApiJson, ApiPath, ApiQuery},
        AppState,
    },
    errors::ApiResult,
};

pub async fn list_travelers(State(state): State<AppState>) -> Json<Vec<AccountSummary>> {
    list_of(&state, AccountKind::Traveler).await
}

/// Opens the traveler's ledger and books every listed service; nothing is
/// kept when any service fails.
pub async fn register_traveler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewTraveler>,
) -> ApiResult<(StatusCode, Json<TravelerRegistration>)> {
    let mut manager = state.manager.lock().await;
    let registration =
        manager.transact(|book, clock| TravelerService::register(book, payload, clock))?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn traveler_ledger(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> ApiResult<Json<AccountStatement>> {
    ledger_of(&state, AccountKind::Traveler, id, query).await
}
