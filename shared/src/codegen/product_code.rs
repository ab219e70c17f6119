//! Product code strategies
//!
//! Product creation and CSV import derive codes differently, so the same category, size
//! and color can produce two different codes depending on the entry path.

use super::SkuGenerator;
use crate::models::Catalog;

pub trait ProductCodeGenerator {
    fn product_code(&self, category: &str, size: &str, color: &str) -> String;
}

/// `<category abbrev>-<size lowercased, no spaces>/<color abbrev>`
#[derive(Debug, Clone, Copy)]
pub struct StandardCodeGenerator<'a> {
    skus: SkuGenerator<'a>,
}

impl<'a> StandardCodeGenerator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            skus: SkuGenerator::new(catalog),
        }
    }
}

impl ProductCodeGenerator for StandardCodeGenerator<'_> {
    fn product_code(&self, category: &str, size: &str, color: &str) -> String {
        let size: String = size.to_lowercase().chars().filter(|c| *c != ' ').collect();
        format!(
            "{}-{}/{}",
            self.skus.category_abbreviation(category),
            size,
            self.skus.color_abbreviation(color)
        )
    }
}

/// CSV import variant: every part forced to exactly 2 characters
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationCodeGenerator;

impl MigrationCodeGenerator {
    fn two_chars(value: &str) -> String {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => "XX".to_string(),
            (Some(first), None) => format!("{}X", first.to_uppercase()),
            (Some(first), Some(second)) => [first, second].iter().collect::<String>().to_uppercase(),
        }
    }
}

impl ProductCodeGenerator for MigrationCodeGenerator {
    fn product_code(&self, category: &str, size: &str, color: &str) -> String {
        format!(
            "{}-{}/{}",
            Self::two_chars(category),
            Self::two_chars(size),
            Self::two_chars(color)
        )
    }
}
