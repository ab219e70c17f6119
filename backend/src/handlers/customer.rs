//! HTTP handlers for customers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Customer, CustomerRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::CustomerService;
use crate::AppState;

pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let service = CustomerService::new(state.repos);
    let customers = service.list().await?;
    Ok(Json(customers))
}

/// Create a customer with the next `C-NNNN` code
pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CustomerRequest>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let service = CustomerService::new(state.repos);
    let customer = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.repos);
    let customer = service.get(id).await?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CustomerRequest>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.repos);
    let customer = service.update(id, input).await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CustomerService::new(state.repos);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
