//! Static catalog tables for form pickers

use axum::{extract::State, Json};
use shared::{BankAccount, CategoryItem, ColorItem};

use crate::AppState;

pub async fn get_config_categories(State(state): State<AppState>) -> Json<Vec<CategoryItem>> {
    Json(state.catalog.categories.clone())
}

pub async fn get_config_colors(State(state): State<AppState>) -> Json<Vec<ColorItem>> {
    Json(state.catalog.colors.clone())
}

/// Active bank accounts only
pub async fn get_config_accounts(State(state): State<AppState>) -> Json<Vec<BankAccount>> {
    Json(state.catalog.active_accounts())
}
