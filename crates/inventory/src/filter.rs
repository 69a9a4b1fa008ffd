//! Filtered views over an item collection.

use serde::{Deserialize, Serialize};

use harvest_core::DomainError;

use crate::item::{Category, InventoryItem};

/// Category restriction for a filtered view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    /// Sentinel: no category restriction.
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(value: Category) -> Self {
        CategoryFilter::Only(value)
    }
}

impl core::str::FromStr for CategoryFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(CategoryFilter::All);
        }
        s.parse::<Category>().map(CategoryFilter::Only)
    }
}

/// Case-insensitive substring match on name, intersected with the category filter.
///
/// Order of `items` is preserved. An empty term matches every name.
pub fn filter<'a>(
    items: &'a [InventoryItem],
    search_term: &str,
    category: CategoryFilter,
) -> Vec<&'a InventoryItem> {
    let needle = search_term.to_lowercase();
    items
        .iter()
        .filter(|item| category.matches(item.category))
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .collect()
}
