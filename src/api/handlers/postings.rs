use axum::{extract::State, http::StatusCode, Json};

use daftar_core::{Posting, PostingReceipt, PostingService};

use crate::{
    api::{extract::ApiJson, AppState},
    errors::ApiResult,
};

pub async fn create_posting(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Posting>,
) -> ApiResult<(StatusCode, Json<PostingReceipt>)> {
    let mut manager = state.manager.lock().await;
    let receipt = manager.transact(|book, clock| PostingService::post(book, payload, clock))?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
