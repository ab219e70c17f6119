//! Category/color abbreviations and SKU IDs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Catalog;

static SKU_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2,3})-(\d{4})$").expect("SKU pattern is a valid regex")
});

/// Split a SKU ID into its abbreviation and sequence number
///
/// Anything not matching `XX-0000` / `XXX-0000` is `None`.
pub fn parse_sku_id(sku_id: &str) -> Option<(&str, u32)> {
    let captures = SKU_PATTERN.captures(sku_id)?;
    let abbreviation = captures.get(1)?.as_str();
    let number = captures.get(2)?.as_str().parse().ok()?;
    Some((abbreviation, number))
}

/// Derives SKU IDs and abbreviations from an immutable catalog snapshot
#[derive(Debug, Clone, Copy)]
pub struct SkuGenerator<'a> {
    catalog: &'a Catalog,
}

impl<'a> SkuGenerator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Configured abbreviation, else derived from the name
    ///
    /// One word gives its first 3 letters; several words give their initials, at most 3.
    pub fn category_abbreviation(&self, category: &str) -> String {
        if let Some(item) = self.catalog.find_category(category) {
            return item.abbreviation.clone();
        }

        let words: Vec<&str> = category.split_whitespace().collect();
        if words.len() == 1 {
            category.chars().take(3).collect::<String>().to_uppercase()
        } else {
            words
                .iter()
                .filter_map(|w| w.chars().next())
                .take(3)
                .collect::<String>()
                .to_uppercase()
        }
    }

    /// Configured abbreviation, else the first 2 letters
    pub fn color_abbreviation(&self, color: &str) -> String {
        match self.catalog.find_color(color) {
            Some(item) => item.abbreviation.clone(),
            None => color.chars().take(2).collect::<String>().to_uppercase(),
        }
    }

    /// `<abbrev>-<last_number + 1, 4 digits>`
    pub fn generate_sku_id(&self, category: &str, last_number: u32) -> String {
        format!(
            "{}-{:04}",
            self.category_abbreviation(category),
            last_number + 1
        )
    }

    /// Highest sequence among `existing` SKUs of this category, 0 if none
    pub fn next_sku_number<S: AsRef<str>>(&self, category: &str, existing: &[S]) -> u32 {
        let abbreviation = self.category_abbreviation(category);
        existing
            .iter()
            .filter_map(|sku| parse_sku_id(sku.as_ref()))
            .filter(|(abbrev, _)| *abbrev == abbreviation)
            .map(|(_, number)| number)
            .max()
            .unwrap_or(0)
    }
}
