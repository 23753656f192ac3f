//! Product entity - Represents an item the shop keeps on its shelves.
//!
//! Stock is tracked as two counters: `initial_stock` only grows (restocks) and
//! `cumulative_sold` only grows (sales). The quantity still on hand is derived
//! from their difference and is never stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Normalized product name (trimmed, upper-cased), unique across the catalog
    #[sea_orm(unique)]
    pub name: String,
    /// Free-form category label (e.g., "Abarrotes", "Beverages")
    pub category: String,
    /// Total units ever received, including the opening stock
    pub initial_stock: i64,
    /// Total units ever sold
    pub cumulative_sold: i64,
    /// Unit purchase cost
    pub cost_price: f64,
    /// Unit selling price
    pub sale_price: f64,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

impl Model {
    /// Units on hand: `initial_stock - cumulative_sold`.
    #[must_use]
    pub const fn available(&self) -> i64 {
        self.initial_stock - self.cumulative_sold
    }

    /// Margin earned on one unit at the current prices.
    #[must_use]
    pub fn unit_margin(&self) -> f64 {
        self.sale_price - self.cost_price
    }
}

/// Products have no foreign-key relations; sales keep their own snapshots.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_available_and_unit_margin() {
        let now = chrono::Utc::now().naive_utc();
        let product = Model {
            id: 1,
            name: "OIL".to_string(),
            category: "Groceries".to_string(),
            initial_stock: 8,
            cumulative_sold: 3,
            cost_price: 10.0,
            sale_price: 12.5,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(product.available(), 5);
        assert_eq!(product.unit_margin(), 2.5);
    }
}
