//! Catalog business logic - Handles all product-related operations.
//!
//! Products are identified to the operator by a normalized name: trimmed,
//! internal whitespace collapsed and upper-cased, so `" Rice "` and `"RICE"` are
//! the same product. Stock counters are only ever changed by in-SQL increments,
//! never by writing back a value read earlier.
//!
//! Every write transaction opens with a write statement, so `SQLite` grants the
//! write lock before the transaction reads anything. Contention that outlasts
//! the busy timeout is retried and finally reported as `Conflict`.

use crate::{
    core::{
        activity::{self, ActivityKind},
        retry::{RetryPolicy, with_contention_retry},
    },
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, info, instrument};

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Display name, normalized before storage
    pub name: String,
    /// Category label
    pub category: String,
    /// Opening stock
    pub initial_stock: i64,
    /// Unit cost
    pub cost_price: f64,
    /// Unit selling price, must be positive
    pub sale_price: f64,
}

/// Changes for [`edit_product`]. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProductEdit {
    /// New name (normalized and checked for uniqueness)
    pub name: Option<String>,
    /// New category label
    pub category: Option<String>,
    /// New unit selling price
    pub sale_price: Option<f64>,
    /// New unit cost
    pub cost_price: Option<f64>,
}

/// Canonical form of a product name: trimmed, single-spaced, upper-case.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn validate_name(name: &str) -> Result<String> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return Err(Error::invalid("Product name cannot be empty"));
    }
    Ok(normalized)
}

fn validate_category(category: &str) -> Result<String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid("Category cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_cost_price(cost_price: f64) -> Result<()> {
    if !cost_price.is_finite() || cost_price < 0.0 {
        return Err(Error::invalid(format!(
            "Cost price must be a non-negative amount, got {cost_price}"
        )));
    }
    Ok(())
}

fn validate_sale_price(sale_price: f64) -> Result<()> {
    if !sale_price.is_finite() || sale_price <= 0.0 {
        return Err(Error::invalid(format!(
            "Sale price must be greater than zero, got {sale_price}"
        )));
    }
    Ok(())
}

fn map_unique_violation(err: DbErr, name: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateName {
            name: name.to_string(),
        },
        _ => err.into(),
    }
}

/// Retrieves all products, ordered alphabetically by name.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by name. The lookup name is normalized first, so
/// `"  rice"` finds `"RICE"`.
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Name.eq(normalize_name(name)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Units of a product still on hand.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist.
pub async fn available(db: &DatabaseConnection, product_id: i64) -> Result<i64> {
    get_product_by_id(db, product_id)
        .await?
        .map(|p| product::Model::available(&p))
        .ok_or(Error::ProductNotFound { product_id })
}

/// Writes a no-op update to the product row. Being the first statement of a
/// transaction, it takes the write lock; returns whether the product exists.
async fn lock_product(txn: &DatabaseTransaction, product_id: i64) -> Result<bool> {
    let result = Product::update_many()
        .col_expr(
            product::Column::InitialStock,
            Expr::col(product::Column::InitialStock).add(0),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(txn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Creates a new product with `cumulative_sold = 0`.
///
/// # Errors
/// Returns an error if:
/// - The name or category is empty
/// - `initial_stock` or `cost_price` is negative, or `sale_price` is not positive
/// - Another product already has the same normalized name
/// - Contention persisted through every retry (`Conflict`)
/// - The database insert fails
#[instrument(skip(db))]
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    let name = validate_name(&new.name)?;
    let category = validate_category(&new.category)?;
    if new.initial_stock < 0 {
        return Err(Error::invalid(format!(
            "Initial stock cannot be negative, got {}",
            new.initial_stock
        )));
    }
    validate_cost_price(new.cost_price)?;
    validate_sale_price(new.sale_price)?;

    if get_product_by_name(db, &name).await?.is_some() {
        return Err(Error::DuplicateName { name });
    }

    let product = with_contention_retry(&RetryPolicy::default(), || {
        try_create_product(db, &name, &category, &new)
    })
    .await?;

    info!(
        "Created product '{}' (ID: {}) in category '{}'",
        product.name, product.id, product.category
    );
    Ok(product)
}

async fn try_create_product(
    db: &DatabaseConnection,
    name: &str,
    category: &str,
    new: &NewProduct,
) -> Result<product::Model> {
    let txn = db.begin().await?;

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        name: Set(name.to_string()),
        category: Set(category.to_string()),
        initial_stock: Set(new.initial_stock),
        cumulative_sold: Set(0),
        cost_price: Set(new.cost_price),
        sale_price: Set(new.sale_price),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    // The unique index rejects a racing insert of the same name
    let product = product
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, name))?;

    activity::append(
        &txn,
        ActivityKind::ProductCreated,
        format!(
            "Created product {} ({}) with {} units",
            product.name, product.category, product.initial_stock
        ),
        None,
    )
    .await?;
    txn.commit().await?;

    Ok(product)
}

/// Adds `quantity` units to a product's stock.
///
/// The increment happens in SQL (`initial_stock = initial_stock + quantity`), so
/// concurrent restocks and sales never overwrite each other.
///
/// # Errors
/// Returns `InvalidInput` if `quantity` is not positive, `ProductNotFound`
/// if the product does not exist and `Conflict` if contention persisted.
#[instrument(skip(db))]
pub async fn restock(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: i64,
) -> Result<product::Model> {
    if quantity <= 0 {
        return Err(Error::invalid(format!(
            "Restock quantity must be positive, got {quantity}"
        )));
    }

    let product = with_contention_retry(&RetryPolicy::default(), || {
        try_restock(db, product_id, quantity)
    })
    .await?;

    info!(
        "Restocked '{}' (ID: {}) by {}, {} available",
        product.name,
        product.id,
        quantity,
        product.available()
    );
    Ok(product)
}

async fn try_restock(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: i64,
) -> Result<product::Model> {
    let txn = db.begin().await?;

    let result = Product::update_many()
        .col_expr(
            product::Column::InitialStock,
            Expr::col(product::Column::InitialStock).add(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { product_id });
    }

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;

    activity::append(
        &txn,
        ActivityKind::StockAdded,
        format!(
            "Added {quantity} units of {} ({} available)",
            product.name,
            product.available()
        ),
        None,
    )
    .await?;
    txn.commit().await?;

    Ok(product)
}

/// Updates any subset of a product's name, category and prices.
///
/// Price changes only affect sales recorded afterwards. An edit that changes
/// nothing returns the product unchanged and logs nothing.
///
/// # Errors
/// Returns an error if:
/// - A provided field fails the same validation as [`create_product`]
/// - The product does not exist
/// - The new name belongs to a different product
/// - Contention persisted through every retry (`Conflict`)
#[instrument(skip(db))]
pub async fn edit_product(
    db: &DatabaseConnection,
    product_id: i64,
    edit: ProductEdit,
) -> Result<product::Model> {
    let new_name = edit.name.as_deref().map(validate_name).transpose()?;
    let new_category = edit.category.as_deref().map(validate_category).transpose()?;
    if let Some(price) = edit.sale_price {
        validate_sale_price(price)?;
    }
    if let Some(price) = edit.cost_price {
        validate_cost_price(price)?;
    }

    let edit = ProductEdit {
        name: new_name,
        category: new_category,
        ..edit
    };
    with_contention_retry(&RetryPolicy::default(), || {
        try_edit_product(db, product_id, &edit)
    })
    .await
}

/// Applies an already validated and normalized edit.
async fn try_edit_product(
    db: &DatabaseConnection,
    product_id: i64,
    edit: &ProductEdit,
) -> Result<product::Model> {
    let txn = db.begin().await?;

    if !lock_product(&txn, product_id).await? {
        return Err(Error::ProductNotFound { product_id });
    }
    let current = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;

    let mut changes = Vec::new();
    let mut product: product::ActiveModel = current.clone().into();

    if let Some(name) = edit.name.as_ref().filter(|n| **n != current.name) {
        if let Some(other) = get_product_by_name(&txn, name).await?
            && other.id != product_id
        {
            return Err(Error::DuplicateName { name: name.clone() });
        }
        changes.push(format!("name {} -> {}", current.name, name));
        product.name = Set(name.clone());
    }
    if let Some(category) = edit.category.as_ref().filter(|c| **c != current.category) {
        changes.push(format!("category {} -> {}", current.category, category));
        product.category = Set(category.clone());
    }
    if let Some(price) = edit.sale_price.filter(|p| p.to_bits() != current.sale_price.to_bits()) {
        changes.push(format!("sale price {} -> {}", current.sale_price, price));
        product.sale_price = Set(price);
    }
    if let Some(price) = edit.cost_price.filter(|p| p.to_bits() != current.cost_price.to_bits()) {
        changes.push(format!("cost price {} -> {}", current.cost_price, price));
        product.cost_price = Set(price);
    }

    if changes.is_empty() {
        txn.rollback().await?;
        debug!("Edit of product {} changed nothing", product_id);
        return Ok(current);
    }

    product.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = product.update(&txn).await.map_err(|e| {
        map_unique_violation(e, edit.name.as_deref().unwrap_or_default())
    })?;

    activity::append(
        &txn,
        ActivityKind::ProductEdited,
        format!("Edited {}: {}", updated.name, changes.join(", ")),
        None,
    )
    .await?;
    txn.commit().await?;

    info!("Edited product {} ({})", updated.id, changes.join(", "));
    Ok(updated)
}

/// Permanently removes a sold-out product. Its past sales keep their snapshots.
///
/// The delete is conditional on `initial_stock <= cumulative_sold` in the same
/// statement, so a restock racing with the delete cannot be lost.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist, and `Conflict` if
/// it still has units on hand or contention persisted.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let product = with_contention_retry(&RetryPolicy::default(), || {
        try_delete_product(db, product_id)
    })
    .await?;

    info!("Deleted product '{}' (ID: {})", product.name, product.id);
    Ok(product)
}

async fn try_delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let txn = db.begin().await?;

    if !lock_product(&txn, product_id).await? {
        return Err(Error::ProductNotFound { product_id });
    }
    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;

    let result = Product::delete_many()
        .filter(product::Column::Id.eq(product_id))
        .filter(
            Expr::col(product::Column::InitialStock)
                .lte(Expr::col(product::Column::CumulativeSold)),
        )
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::Conflict {
            message: format!(
                "'{}' still has {} units available and cannot be deleted",
                product.name,
                product.available()
            ),
        });
    }

    activity::append(
        &txn,
        ActivityKind::ProductDeleted,
        format!("Deleted product {}", product.name),
        None,
    )
    .await?;
    txn.commit().await?;

    Ok(product)
}

/// Inserts configured starter products whose names are not in the catalog yet.
///
/// Returns the products that were created. Existing products are left untouched,
/// so seeding on every start-up is harmless.
pub async fn seed_products(
    db: &DatabaseConnection,
    products: &[NewProduct],
) -> Result<Vec<product::Model>> {
    let mut created = Vec::new();
    for new in products {
        if get_product_by_name(db, &new.name).await?.is_some() {
            debug!("Product '{}' already exists, not seeding", new.name);
            continue;
        }
        created.push(create_product(db, new.clone()).await?);
    }
    if !created.is_empty() {
        info!("Seeded {} products", created.len());
    }
    Ok(created)
}
