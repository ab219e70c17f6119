//! Quotations: priced offers that never touch stock or price statistics

use chrono::Utc;
use shared::{generate_quotation_code, CustomerSnapshot, Quotation, QuotationRequest, SaleRequest};
use uuid::Uuid;
use validator::Validate;

use super::{customer_snapshot, find_product, lookup_customer, today, MAX_WRITE_ATTEMPTS};
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct QuotationService {
    repos: Repositories,
}

impl QuotationService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Next `QU-YYMM-NNNN`, continuing from the newest stored code
    pub async fn generate_code(&self) -> AppResult<String> {
        let last = self.repos.quotations.last_quotation_code().await?;
        Ok(generate_quotation_code(&last.unwrap_or_default(), &today())?)
    }

    async fn check_request(&self, request: &QuotationRequest) -> AppResult<CustomerSnapshot> {
        request.validate()?;

        let customer = lookup_customer(self.repos.customers.as_ref(), &request.customer_id)
            .await?
            .ok_or_else(|| AppError::validation("Customer not found"))?;

        for item in &request.items {
            if find_product(self.repos.products.as_ref(), &item.product_id)
                .await?
                .is_none()
            {
                return Err(AppError::validation(format!(
                    "Product not found: {}",
                    item.product_id
                )));
            }
        }

        Ok(customer_snapshot(&customer))
    }

    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create(&self, request: QuotationRequest) -> AppResult<Quotation> {
        let snapshot = self.check_request(&request).await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = self.generate_code().await?;
            let quotation =
                Quotation::from_request(request.clone(), code, snapshot.clone(), Utc::now());
            match self.repos.quotations.create(&quotation).await {
                Ok(()) => {
                    tracing::info!(code = %quotation.quotation_code, "Quotation created");
                    return Ok(quotation);
                }
                Err(AppError::DuplicateEntry(what)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!("Quotation code collision on {}, regenerating", what);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Quotation> {
        self.repos
            .quotations
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<Quotation>> {
        self.repos.quotations.get_all().await
    }

    pub async fn update(&self, id: Uuid, request: QuotationRequest) -> AppResult<Quotation> {
        let snapshot = self.check_request(&request).await?;

        let mut quotation = self.get(id).await?;
        quotation.apply_request(request, Utc::now());
        quotation.customer = snapshot;

        self.repos.quotations.update(&quotation).await?;
        Ok(quotation)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repos.quotations.delete(id).await? {
            return Err(AppError::NotFound("Quotation".to_string()));
        }
        Ok(())
    }

    /// Prefilled sale request; nothing is stored
    pub async fn copy_to_sale(&self, id: Uuid) -> AppResult<SaleRequest> {
        let quotation = self.get(id).await?;
        Ok(quotation.to_sale_request(Utc::now()))
    }
}
