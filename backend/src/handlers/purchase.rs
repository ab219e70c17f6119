//! HTTP handlers for purchases

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Purchase, PurchaseRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::PurchaseService;
use crate::AppState;

fn service(state: &AppState) -> PurchaseService {
    PurchaseService::new(state.repos.clone(), state.catalog.clone())
}

pub async fn list_purchases(State(state): State<AppState>) -> AppResult<Json<Vec<Purchase>>> {
    let purchases = service(&state).list().await?;
    Ok(Json(purchases))
}

/// Create a purchase; product prices and stock follow best-effort
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(input): Json<PurchaseRequest>,
) -> AppResult<(StatusCode, Json<Purchase>)> {
    let purchase = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Purchase>> {
    let purchase = service(&state).get(id).await?;
    Ok(Json(purchase))
}

pub async fn update_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PurchaseRequest>,
) -> AppResult<Json<Purchase>> {
    let purchase = service(&state).update(id, input).await?;
    Ok(Json(purchase))
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
