//! Customer and supplier records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::validation::{validate_thai_phone, validate_thai_tax_id};

/// Customer record (suppliers share the same collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    /// `C-NNNN`
    pub customer_code: String,
    pub company_name: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a customer
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerRequest {
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    pub contact_name: String,
    #[validate(custom = "optional_tax_id")]
    pub tax_id: String,
    #[validate(custom = "optional_phone")]
    pub phone: String,
    pub address: String,
    pub contact_method: String,
}

fn optional_tax_id(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    validate_thai_tax_id(value).map_err(|msg| {
        let mut err = ValidationError::new("tax_id");
        err.message = Some(msg.into());
        err
    })
}

fn optional_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    validate_thai_phone(value).map_err(|msg| {
        let mut err = ValidationError::new("phone");
        err.message = Some(msg.into());
        err
    })
}

impl Customer {
    pub fn from_request(request: CustomerRequest, customer_code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_code,
            company_name: request.company_name,
            contact_name: request.contact_name,
            tax_id: request.tax_id,
            phone: request.phone,
            address: request.address,
            contact_method: request.contact_method,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_request(&mut self, request: CustomerRequest, now: DateTime<Utc>) {
        self.company_name = request.company_name;
        self.contact_name = request.contact_name;
        self.tax_id = request.tax_id;
        self.phone = request.phone;
        self.address = request.address;
        self.contact_method = request.contact_method;
        self.updated_at = now;
    }
}
