//! HTTP handlers for sales

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Sale, SaleRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::SaleService;
use crate::AppState;

fn service(state: &AppState) -> SaleService {
    SaleService::new(state.repos.clone(), state.catalog.clone())
}

pub async fn list_sales(State(state): State<AppState>) -> AppResult<Json<Vec<Sale>>> {
    let sales = service(&state).list().await?;
    Ok(Json(sales))
}

/// Create a sale; every product must exist and its stock is taken
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<SaleRequest>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    let sale = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let sale = service(&state).get(id).await?;
    Ok(Json(sale))
}

pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SaleRequest>,
) -> AppResult<Json<Sale>> {
    let sale = service(&state).update(id, input).await?;
    Ok(Json(sale))
}

/// Delete a sale and put its stock back
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
