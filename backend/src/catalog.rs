//! Loading of the static catalog tables

use serde::{de::DeserializeOwned, Deserialize};
use shared::{BankAccount, Catalog, CategoryItem, ColorItem};
use std::path::Path;

use crate::error::{AppError, AppResult};

#[derive(Deserialize)]
struct CategoriesFile {
    categories: Vec<CategoryItem>,
}

#[derive(Deserialize)]
struct ColorsFile {
    colors: Vec<ColorItem>,
}

/// Read `categories.json`, `colors.json` and `accounts.json` from `dir`
///
/// A missing file yields an empty table; a malformed one is an error.
pub fn load_catalog(dir: impl AsRef<Path>) -> AppResult<Catalog> {
    let dir = dir.as_ref();

    let categories = read_table::<CategoriesFile>(&dir.join("categories.json"))?
        .map(|f| f.categories)
        .unwrap_or_default();
    let colors = read_table::<ColorsFile>(&dir.join("colors.json"))?
        .map(|f| f.colors)
        .unwrap_or_default();
    let accounts = read_table::<Vec<BankAccount>>(&dir.join("accounts.json"))?.unwrap_or_default();

    tracing::info!(
        categories = categories.len(),
        colors = colors.len(),
        accounts = accounts.len(),
        "Catalog loaded from {}",
        dir.display()
    );

    Ok(Catalog {
        categories,
        colors,
        accounts,
    })
}

fn read_table<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Catalog file {} not found, using an empty table", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| AppError::Configuration(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_gives_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = load_catalog(dir.path().join("nope")).unwrap();
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn test_loads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("categories.json"),
            r#"{"categories":[{"name":"กล่อง","english":"Box","abbreviation":"BX"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("colors.json"),
            r#"{"colors":[{"name":"ขาว","english":"White","abbreviation":"WH"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("accounts.json"),
            r#"[{"id":"kbank-1","name":"Goodpack","accountNumber":"123-4-56789-0","bankName":"KBank","accountType":"savings","isActive":true}]"#,
        )
        .unwrap();

        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog.categories[0].abbreviation, "BX");
        assert_eq!(catalog.colors[0].abbreviation, "WH");
        assert_eq!(catalog.active_accounts().len(), 1);
    }

    #[test]
    fn test_malformed_table_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("colors.json"), "{not json").unwrap();
        assert!(matches!(
            load_catalog(dir.path()),
            Err(AppError::Configuration(_))
        ));
    }
}
