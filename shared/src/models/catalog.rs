//! Static catalog tables: categories, colors and bank accounts

use serde::{Deserialize, Serialize};

/// Configured product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub name: String,
    #[serde(default)]
    pub english: String,
    pub abbreviation: String,
}

/// Configured product color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorItem {
    pub name: String,
    #[serde(default)]
    pub english: String,
    pub abbreviation: String,
}

/// One of our bank accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub name: String,
    pub account_number: String,
    pub bank_name: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub is_active: bool,
}

impl BankAccount {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.account_number)
    }
}

/// Immutable snapshot of the catalog tables, loaded once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub categories: Vec<CategoryItem>,
    pub colors: Vec<ColorItem>,
    pub accounts: Vec<BankAccount>,
}

impl Catalog {
    /// Case-insensitive match on `name` or `english`
    pub fn find_category(&self, value: &str) -> Option<&CategoryItem> {
        self.categories
            .iter()
            .find(|c| matches_entry(value, &c.name, &c.english))
    }

    pub fn find_color(&self, value: &str) -> Option<&ColorItem> {
        self.colors
            .iter()
            .find(|c| matches_entry(value, &c.name, &c.english))
    }

    pub fn active_accounts(&self) -> Vec<BankAccount> {
        self.accounts.iter().filter(|a| a.is_active).cloned().collect()
    }

    pub fn find_account(&self, id: &str) -> Option<&BankAccount> {
        self.accounts.iter().find(|a| a.id == id)
    }
}

fn matches_entry(value: &str, name: &str, english: &str) -> bool {
    let value = value.to_lowercase();
    value == name.to_lowercase() || (!english.is_empty() && value == english.to_lowercase())
}
