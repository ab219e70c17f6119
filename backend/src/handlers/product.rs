//! HTTP handlers for products, their stock/price documents, QR payloads and images

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{InventorySummary, PriceUpdateRequest, Product, ProductRequest, StockUpdateRequest};

use super::read_file_field;
use crate::error::AppResult;
use crate::services::image::ImageStore;
use crate::services::product::{ImageResponse, QrCodeData};
use crate::services::ProductService;
use crate::AppState;

fn service(state: &AppState) -> ProductService {
    ProductService::new(state.repos.clone(), state.catalog.clone())
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

/// List all products
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = service(&state).list().await?;
    Ok(Json(products))
}

/// Create a product; SKU and product code are generated
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a product by id or SKU
pub async fn get_product(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Product>> {
    let product = service(&state).get(&key).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<ProductRequest>,
) -> AppResult<Json<Product>> {
    let product = service(&state).update(&key, input).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    service(&state).delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the whole stock document
pub async fn update_product_stock(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<StockUpdateRequest>,
) -> AppResult<Json<Product>> {
    let product = service(&state).update_stock(&key, input.stock).await?;
    Ok(Json(product))
}

/// Replace the whole price document
pub async fn update_product_price(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<PriceUpdateRequest>,
) -> AppResult<Json<Product>> {
    let product = service(&state).update_price(&key, input.price).await?;
    Ok(Json(product))
}

pub async fn get_inventory_summary(
    State(state): State<AppState>,
) -> AppResult<Json<InventorySummary>> {
    let summary = service(&state).inventory_summary().await?;
    Ok(Json(summary))
}

pub async fn get_low_stock_products(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let products = service(&state).low_stock(query.threshold).await?;
    Ok(Json(products))
}

pub async fn get_products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let products = service(&state).by_category(&category).await?;
    Ok(Json(products))
}

/// Distinct categories in use
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let categories = service(&state).categories().await?;
    Ok(Json(categories))
}

pub async fn get_product_qr(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<QrCodeData>> {
    let qr = service(&state)
        .qr_data(&key, &state.config.qr.base_url)
        .await?;
    Ok(Json(qr))
}

/// Upload a product image from the multipart field `image`
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ImageResponse>> {
    let file = read_file_field(&mut multipart, "image", "No image file uploaded").await?;
    let store = ImageStore::new(&state.config.uploads);
    let response = service(&state)
        .upload_image(&key, &store, &file.file_name, &file.bytes)
        .await?;
    Ok(Json(response))
}

pub async fn delete_product_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ImageResponse>> {
    let store = ImageStore::new(&state.config.uploads);
    let response = service(&state).delete_image(&key, &store).await?;
    Ok(Json(response))
}
