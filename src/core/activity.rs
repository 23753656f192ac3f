//! Activity log - Append-only audit trail of sales, catalog changes and store transitions.
//!
//! Entries are written inside the same database transaction as the change they
//! describe, so the trail never shows an event that did not commit. Reading is
//! ordered by insertion sequence, newest first.

use crate::{
    entities::{ActivityLog, activity_log},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use std::{fmt, str::FromStr};

/// Kind of event recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// A unit was sold
    Sale,
    /// A product was added to the catalog
    ProductCreated,
    /// Stock was received for a product
    StockAdded,
    /// A product's name, category or prices changed
    ProductEdited,
    /// A sold-out product was removed from the catalog
    ProductDeleted,
    /// The store was opened
    StoreOpened,
    /// The store was closed
    StoreClosed,
}

impl ActivityKind {
    /// Canonical label stored in the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::ProductCreated => "PRODUCT_CREATED",
            Self::StockAdded => "STOCK_ADDED",
            Self::ProductEdited => "PRODUCT_EDITED",
            Self::ProductDeleted => "PRODUCT_DELETED",
            Self::StoreOpened => "STORE_OPENED",
            Self::StoreClosed => "STORE_CLOSED",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SALE" => Ok(Self::Sale),
            "PRODUCT_CREATED" => Ok(Self::ProductCreated),
            "STOCK_ADDED" => Ok(Self::StockAdded),
            "PRODUCT_EDITED" => Ok(Self::ProductEdited),
            "PRODUCT_DELETED" => Ok(Self::ProductDeleted),
            "STORE_OPENED" => Ok(Self::StoreOpened),
            "STORE_CLOSED" => Ok(Self::StoreClosed),
            other => Err(Error::invalid(format!("Unknown activity kind '{other}'"))),
        }
    }
}

impl activity_log::Model {
    /// Parses the stored `kind` label.
    pub fn activity_kind(&self) -> Result<ActivityKind> {
        self.kind.parse()
    }
}

/// Appends an entry to the activity log.
///
/// Accepts any connection so callers can append inside their own transaction.
/// `amount` is only meaningful for [`ActivityKind::Sale`] and is dropped for other kinds.
pub async fn append<C>(
    db: &C,
    kind: ActivityKind,
    description: String,
    amount: Option<f64>,
) -> Result<activity_log::Model>
where
    C: ConnectionTrait,
{
    let amount = match kind {
        ActivityKind::Sale => amount,
        _ => None,
    };

    let entry = activity_log::ActiveModel {
        timestamp: Set(chrono::Utc::now()),
        kind: Set(kind.as_str().to_string()),
        description: Set(description),
        amount: Set(amount),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Returns up to `limit` entries, most recent first.
///
/// Each call re-reads the table, so the result reflects everything committed so far.
pub async fn recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<activity_log::Model>> {
    ActivityLog::find()
        .order_by_desc(activity_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the most recent entries of one kind, newest first.
pub async fn recent_of_kind(
    db: &DatabaseConnection,
    kind: ActivityKind,
    limit: u64,
) -> Result<Vec<activity_log::Model>> {
    ActivityLog::find()
        .filter(activity_log::Column::Kind.eq(kind.as_str()))
        .order_by_desc(activity_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
