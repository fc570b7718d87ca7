use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use daftar_core::{NewPeriod, PeriodService};
use daftar_domain::{EntryDraft, Period, PeriodSummary};

use crate::{
    api::{
        extract::{ApiJson, ApiPath},
        AppState,
    },
    errors::{ApiError, ApiResult},
};

/// A period plus its summary: frozen once closed, live while active.
#[derive(Debug, Serialize)]
pub struct PeriodView {
    #[serde(flatten)]
    pub period: Period,
    pub current_summary: PeriodSummary,
}

impl From<&Period> for PeriodView {
    fn from(period: &Period) -> Self {
        Self {
            current_summary: period.current_summary(),
            period: period.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClosePeriodRequest {
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RecordedEntry {
    pub id: Uuid,
}

pub async fn list_periods(State(state): State<AppState>) -> Json<Vec<PeriodView>> {
    let manager = state.manager.lock().await;
    Json(PeriodService::list(manager.book()).into_iter().map(PeriodView::from).collect())
}

pub async fn open_period(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewPeriod>,
) -> ApiResult<(StatusCode, Json<PeriodView>)> {
    let mut manager = state.manager.lock().await;
    let id = manager.transact(|book, clock| PeriodService::open(book, payload, clock))?;
    let period = PeriodService::get(manager.book(), id)?;
    Ok((StatusCode::CREATED, Json(PeriodView::from(period))))
}

pub async fn get_period(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<PeriodView>> {
    let manager = state.manager.lock().await;
    Ok(Json(PeriodView::from(PeriodService::get(manager.book(), id)?)))
}

/// Closing an already closed period answers 409. The body is optional; without
/// one the period ends today.
pub async fn close_period(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    body: Bytes,
) -> ApiResult<Json<PeriodSummary>> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        ClosePeriodRequest::default()
    } else {
        serde_json::from_slice::<ClosePeriodRequest>(&body)
            .map_err(|err| ApiError::BadRequest(format!("Invalid close request: {err}")))?
    };
    let mut manager = state.manager.lock().await;
    let summary =
        manager.transact(|book, clock| PeriodService::close(book, id, payload.end_date, clock))?;
    Ok(Json(summary))
}

pub async fn record_entry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<EntryDraft>,
) -> ApiResult<(StatusCode, Json<RecordedEntry>)> {
    let mut manager = state.manager.lock().await;
    let entry_id = manager.transact(|book, clock| PeriodService::record(book, id, payload, clock))?;
    Ok((StatusCode::CREATED, Json(RecordedEntry { id: entry_id })))
}
