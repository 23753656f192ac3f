//! Ledger business logic - Records sales against the catalog.
//!
//! A sale is one database transaction that:
//! 1. bumps `cumulative_sold` with a conditional update
//!    (`WHERE initial_stock > cumulative_sold`), which acts as a row-level
//!    compare-and-swap: two sellers racing for the last unit cannot both match,
//! 2. checks the store is open, rolling the claim back if it is not,
//! 3. inserts the sale with the product's current name, category and prices,
//! 4. appends the `SALE` activity entry.
//!
//! The claim is the first statement of the transaction, so `SQLite` takes the
//! write lock before anything is read and a competing seller waits on the busy
//! timeout instead of failing a lock upgrade. Storage contention that outlasts
//! the timeout rolls the whole transaction back and retries it with bounded
//! exponential backoff; business-rule failures are returned at once.

use crate::{
    core::{
        activity::{self, ActivityKind},
        retry::{RetryPolicy, with_contention_retry},
        store_gate,
    },
    entities::{Product, Sale, product, sale},
    errors::{Error, Result},
};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Sells one unit of a product using the default [`RetryPolicy`].
pub async fn record_sale(db: &DatabaseConnection, product_id: i64) -> Result<sale::Model> {
    record_sale_with_policy(db, product_id, &RetryPolicy::default()).await
}

/// Sells one unit of a product.
///
/// # Errors
/// Returns an error if:
/// - The store is closed (`StoreClosed`)
/// - The product does not exist (`ProductNotFound`)
/// - No units are available (`OutOfStock`)
/// - Contention persisted through every retry (`Conflict`)
///
/// On any error nothing is written.
#[instrument(skip(db, policy))]
pub async fn record_sale_with_policy(
    db: &DatabaseConnection,
    product_id: i64,
    policy: &RetryPolicy,
) -> Result<sale::Model> {
    let sale = with_contention_retry(policy, || try_record_sale(db, product_id)).await?;
    info!(
        "Recorded sale {} of '{}' for {}",
        sale.id, sale.product_name, sale.unit_sale_price
    );
    Ok(sale)
}

async fn try_record_sale(db: &DatabaseConnection, product_id: i64) -> Result<sale::Model> {
    let txn = db.begin().await?;

    // Claim one unit; matches nothing if the product is missing or sold out
    let claimed = Product::update_many()
        .col_expr(
            product::Column::CumulativeSold,
            Expr::col(product::Column::CumulativeSold).add(1),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(
            Expr::col(product::Column::InitialStock)
                .gt(Expr::col(product::Column::CumulativeSold)),
        )
        .exec(&txn)
        .await?;

    if !store_gate::is_open(&txn).await? {
        txn.rollback().await?;
        return Err(Error::StoreClosed);
    }

    if claimed.rows_affected == 0 {
        return Err(refusal(&txn, product_id).await?);
    }

    // Re-read inside the transaction so the snapshot matches the claimed row
    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;

    let sale = sale::ActiveModel {
        product_id: Set(product.id),
        product_name: Set(product.name.clone()),
        category: Set(product.category.clone()),
        timestamp: Set(Utc::now()),
        unit_sale_price: Set(product.sale_price),
        unit_cost_price: Set(product.cost_price),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    activity::append(
        &txn,
        ActivityKind::Sale,
        format!(
            "Sold 1 x {} ({} left)",
            product.name,
            product.available()
        ),
        Some(sale.unit_sale_price),
    )
    .await?;

    txn.commit().await?;
    Ok(sale)
}

/// Why a claim matched no row: the product is gone or has nothing left.
async fn refusal(txn: &DatabaseTransaction, product_id: i64) -> Result<Error> {
    let product = Product::find_by_id(product_id)
        .one(txn)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;
    debug!("'{}' has {} units, refusing sale", product.name, product.available());
    Ok(Error::OutOfStock {
        product_id,
        name: product.name,
    })
}

/// Retrieves a specific sale by its unique ID.
pub async fn get_sale_by_id(db: &DatabaseConnection, sale_id: i64) -> Result<Option<sale::Model>> {
    Sale::find_by_id(sale_id).one(db).await.map_err(Into::into)
}

/// Retrieves every sale, newest first.
pub async fn list_sales(db: &DatabaseConnection) -> Result<Vec<sale::Model>> {
    Sale::find()
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the sales of one product, newest first.
pub async fn sales_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<sale::Model>> {
    Sale::find()
        .filter(sale::Column::ProductId.eq(product_id))
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the sales recorded on one (UTC) calendar day, oldest first.
pub async fn sales_on_day(db: &DatabaseConnection, day: NaiveDate) -> Result<Vec<sale::Model>> {
    let start = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::invalid(format!("Invalid day {day}")))?;
    let end = day
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::invalid(format!("No day after {day}")))?;

    Sale::find()
        .filter(sale::Column::Timestamp.gte(Utc.from_utc_datetime(&start)))
        .filter(sale::Column::Timestamp.lt(Utc.from_utc_datetime(&end)))
        .order_by_asc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
