//! HTTP handlers for quotations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Quotation, QuotationRequest, SaleRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::QuotationService;
use crate::AppState;

pub async fn list_quotations(State(state): State<AppState>) -> AppResult<Json<Vec<Quotation>>> {
    let service = QuotationService::new(state.repos);
    let quotations = service.list().await?;
    Ok(Json(quotations))
}

pub async fn create_quotation(
    State(state): State<AppState>,
    Json(input): Json<QuotationRequest>,
) -> AppResult<(StatusCode, Json<Quotation>)> {
    let service = QuotationService::new(state.repos);
    let quotation = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

pub async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Quotation>> {
    let service = QuotationService::new(state.repos);
    let quotation = service.get(id).await?;
    Ok(Json(quotation))
}

pub async fn update_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<QuotationRequest>,
) -> AppResult<Json<Quotation>> {
    let service = QuotationService::new(state.repos);
    let quotation = service.update(id, input).await?;
    Ok(Json(quotation))
}

pub async fn delete_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = QuotationService::new(state.repos);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sale request prefilled from a quotation, for the sale form
pub async fn copy_quotation_to_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SaleRequest>> {
    let service = QuotationService::new(state.repos);
    let request = service.copy_to_sale(id).await?;
    Ok(Json(request))
}
