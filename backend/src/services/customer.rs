//! Customer service

use chrono::Utc;
use shared::{next_customer_code, Customer, CustomerRequest};
use uuid::Uuid;
use validator::Validate;

use super::MAX_WRITE_ATTEMPTS;
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct CustomerService {
    repos: Repositories,
}

impl CustomerService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Next free `C-NNNN`
    pub async fn generate_code(&self) -> AppResult<String> {
        let codes = self.repos.customers.customer_codes().await?;
        Ok(next_customer_code(&codes))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CustomerRequest) -> AppResult<Customer> {
        request.validate()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = self.generate_code().await?;
            let customer = Customer::from_request(request.clone(), code, Utc::now());
            match self.repos.customers.create(&customer).await {
                Ok(()) => {
                    tracing::info!(code = %customer.customer_code, "Customer created");
                    return Ok(customer);
                }
                Err(AppError::DuplicateEntry(what)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!("Customer code collision on {}, regenerating", what);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Customer> {
        self.repos
            .customers
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<Customer>> {
        self.repos.customers.get_all().await
    }

    pub async fn update(&self, id: Uuid, request: CustomerRequest) -> AppResult<Customer> {
        request.validate()?;
        let mut customer = self.get(id).await?;
        customer.apply_request(request, Utc::now());
        self.repos.customers.update(&customer).await?;
        Ok(customer)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repos.customers.delete(id).await? {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }
}
