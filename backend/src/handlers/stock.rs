//! HTTP handlers for manual stock adjustments and the stock audit trail

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{Product, StockAdjustment, StockAdjustmentRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::{HistoryQuery, PagingQuery, SourceQuery};
use crate::services::StockService;
use crate::AppState;

/// Manual adjustment of a product found by id or SKU
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<StockAdjustmentRequest>,
) -> AppResult<Json<Product>> {
    let service = StockService::new(state.repos);
    let product = service.adjust(&key, input).await?;
    Ok(Json(product))
}

/// Stock history of one product, newest first
pub async fn get_stock_history(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<StockAdjustment>>> {
    let service = StockService::new(state.repos);
    let history = service.history(&key, &query).await?;
    Ok(Json(history))
}

pub async fn list_stock_adjustments(
    State(state): State<AppState>,
    Query(query): Query<PagingQuery>,
) -> AppResult<Json<Vec<StockAdjustment>>> {
    let service = StockService::new(state.repos);
    let history = service.all_history(query.paging()).await?;
    Ok(Json(history))
}

pub async fn get_stock_adjustments_by_source(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
) -> AppResult<Json<Vec<StockAdjustment>>> {
    let service = StockService::new(state.repos);
    let history = service.history_by_source(&query).await?;
    Ok(Json(history))
}

/// Undo an adjustment and delete its record
pub async fn reverse_stock_adjustment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = StockService::new(state.repos);
    let product = service.reverse(id).await?;
    Ok(Json(product))
}
