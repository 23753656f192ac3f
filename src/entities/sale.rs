//! Sale entity - One unit of one product sold at a point in time.
//!
//! Name, category and both prices are copied from the product when the sale is
//! recorded, so later edits (or deletion) of the product never rewrite history.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the product that was sold
    pub product_id: i64,
    /// Product name at the time of sale
    pub product_name: String,
    /// Product category at the time of sale
    pub category: String,
    /// When the sale was recorded
    pub timestamp: DateTimeUtc,
    /// Selling price charged for the unit
    pub unit_sale_price: f64,
    /// Cost price of the unit when it was sold
    pub unit_cost_price: f64,
}

impl Model {
    /// Cash taken for this sale.
    #[must_use]
    pub const fn revenue(&self) -> f64 {
        self.unit_sale_price
    }

    /// `unit_sale_price - unit_cost_price`
    #[must_use]
    pub fn profit(&self) -> f64 {
        self.unit_sale_price - self.unit_cost_price
    }
}

/// Sales outlive the products they reference, so no foreign key is declared.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
