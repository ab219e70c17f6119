//! HTTP handlers for the Goodpack inventory server

mod catalog;
mod customer;
mod health;
mod migration;
mod product;
mod purchase;
mod quotation;
mod sale;
mod stock;

pub use catalog::*;
pub use customer::*;
pub use health::*;
pub use migration::*;
pub use product::*;
pub use purchase::*;
pub use quotation::*;
pub use sale::*;
pub use stock::*;

use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

/// An uploaded file: client file name and contents
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Read the multipart field `name`, skipping any other fields
pub async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
    missing: &str,
) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Failed to parse form: {}", e)))?
    {
        if field.name() != Some(name) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read uploaded file: {}", e)))?;
        return Ok(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::validation(missing))
}
