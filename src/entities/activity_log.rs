//! Activity log entity - Append-only audit trail of everything that happened in the shop.
//!
//! The autoincrement `id` is the ordering key: entries recorded within the same
//! timestamp are still returned in the order they were written.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Activity log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    /// Insertion sequence number
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the event was recorded
    pub timestamp: DateTimeUtc,
    /// Event kind label: `"SALE"`, `"PRODUCT_CREATED"`, `"STOCK_ADDED"`, ...
    pub kind: String,
    /// Human-readable description of the event
    pub description: String,
    /// Cash amount, only present for `"SALE"` entries
    pub amount: Option<f64>,
}

/// `ActivityLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
