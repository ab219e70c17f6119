//! HTTP handlers for CSV imports

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use super::read_file_field;
use crate::error::{AppError, AppResult};
use crate::services::migration::{MigrationEntity, MigrationResult, MigrationStatus};
use crate::services::MigrationService;
use crate::AppState;

/// Import the multipart field `csvFile` into `entity`
pub async fn import_csv(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<MigrationResult>> {
    let entity: MigrationEntity = entity.parse()?;
    let file = read_file_field(&mut multipart, "csvFile", "No CSV file uploaded").await?;
    if file.bytes.len() > state.config.migration.max_csv_bytes {
        return Err(AppError::validation(format!(
            "CSV file too large. Maximum size is {}MB",
            state.config.migration.max_csv_bytes / (1024 * 1024)
        )));
    }

    let service = MigrationService::new(state.repos, state.catalog);
    let result = match entity {
        MigrationEntity::Customers => service.import_customers(&file.bytes).await?,
        MigrationEntity::Products => service.import_products(&file.bytes).await?,
        MigrationEntity::Purchases => service.import_purchases(&file.bytes).await?,
        MigrationEntity::Sales => service.import_sales(&file.bytes).await?,
    };
    Ok(Json(result))
}

/// Example CSV download
pub async fn get_csv_template(Path(entity): Path<String>) -> AppResult<impl IntoResponse> {
    let entity: MigrationEntity = entity.parse()?;
    let disposition = format!("attachment; filename={}", entity.template_file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        entity.template(),
    ))
}

pub async fn get_migration_status(
    State(state): State<AppState>,
) -> AppResult<Json<MigrationStatus>> {
    let service = MigrationService::new(state.repos, state.catalog);
    let status = service.status().await?;
    Ok(Json(status))
}
