use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_core::{DomainError, DomainResult, Entity, ItemId};

use crate::coerce::{clamp_non_negative, coerce_amount};

/// Unit an item is counted in.
///
/// Serialized with the backend-native names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "kg")]
    Mass,
    #[serde(rename = "unidad")]
    Count,
    #[serde(rename = "manojo")]
    Bunch,
    #[serde(rename = "docena")]
    Dozen,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Mass, Unit::Count, Unit::Bunch, Unit::Dozen];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Mass => "kg",
            Unit::Count => "unidad",
            Unit::Bunch => "manojo",
            Unit::Dozen => "docena",
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown unit '{s}'")))
    }
}

/// Produce category.
///
/// Serialized with the backend-native names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "hoja")]
    Leafy,
    #[serde(rename = "raiz")]
    Root,
    #[serde(rename = "fruto")]
    Fruiting,
    #[serde(rename = "bulbo")]
    Bulb,
    #[serde(rename = "otro")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Leafy,
        Category::Root,
        Category::Fruiting,
        Category::Bulb,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Leafy => "hoja",
            Category::Root => "raiz",
            Category::Fruiting => "fruto",
            Category::Bulb => "bulbo",
            Category::Other => "otro",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown category '{s}'")))
    }
}

/// One inventory record as confirmed by the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub min_stock: f64,
    pub category: Category,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// `0 < quantity <= min_stock`.
    pub fn is_low_stock(&self) -> bool {
        self.quantity > 0.0 && self.quantity <= self.min_stock
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0.0
    }

    /// Value of the stock on hand (`quantity * price`).
    pub fn stock_value(&self) -> f64 {
        self.quantity * self.price
    }

    /// Collection order shared by every backend: name ignoring case, then
    /// exact name (code point order), then id.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Raw create input, as typed into a form.
///
/// Numeric fields stay textual until [`ItemDraft::validate`] applies
/// [`coerce_amount`] to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    pub unit: Unit,
    pub min_stock: String,
    pub category: Category,
    pub price: String,
}

impl ItemDraft {
    /// Check the draft and coerce its numeric fields.
    ///
    /// Only a blank name is rejected; numeric input is never rejected.
    pub fn validate(&self) -> DomainResult<NewItem> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(NewItem {
            name: name.to_string(),
            quantity: coerce_amount(&self.quantity),
            unit: self.unit,
            min_stock: coerce_amount(&self.min_stock),
            category: self.category,
            price: coerce_amount(&self.price),
        })
    }
}

/// A validated item ready to be inserted remotely (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub min_stock: f64,
    pub category: Category,
    pub price: f64,
}

/// Partial update: only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ItemPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(quantity: f64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_min_stock(mut self, min_stock: f64) -> Self {
        self.min_stock = Some(min_stock);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.min_stock.is_none()
            && self.category.is_none()
            && self.price.is_none()
    }

    /// Trim the name and clamp present amounts to `>= 0`.
    ///
    /// A present-but-blank name is rejected.
    pub fn normalized(self) -> DomainResult<Self> {
        let name = match self.name {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation("name cannot be empty"));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        Ok(Self {
            name,
            quantity: self.quantity.map(clamp_non_negative),
            unit: self.unit,
            min_stock: self.min_stock.map(clamp_non_negative),
            category: self.category,
            price: self.price.map(clamp_non_negative),
        })
    }

    /// Apply the patch to a record in place (used by in-process backends).
    pub fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(unit) = self.unit {
            item.unit = unit;
        }
        if let Some(min_stock) = self.min_stock {
            item.min_stock = min_stock;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
    }
}
