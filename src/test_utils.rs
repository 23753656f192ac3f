//! Shared test utilities for the shopkeeper ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        catalog::{self, NewProduct},
        store_gate,
    },
    entities,
    errors::Result,
};
use sea_orm::{ConnectOptions, DatabaseConnection};
use tempfile::TempDir;

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is limited to one connection: every connection to `sqlite::memory:`
/// would otherwise get its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database in a temporary directory with a pool
/// of several connections, so concurrent callers really contend for locks.
///
/// Keep the returned `TempDir` alive for as long as the connection is used.
pub async fn setup_file_db() -> Result<(TempDir, DatabaseConnection)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("shop.sqlite").display());
    let mut options = ConnectOptions::new(url);
    options.max_connections(8).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((dir, db))
}

/// Sets up a database whose store is already open.
pub async fn setup_open_store() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    store_gate::open_store(&db).await?;
    Ok(db)
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `category`: "Groceries"
/// * `initial_stock`: 10
/// * `cost_price`: 4.0
/// * `sale_price`: 5.0
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    create_custom_product(db, name, "Groceries", 10, 4.0, 5.0).await
}

/// Creates a test product with custom parameters.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    category: &str,
    initial_stock: i64,
    cost_price: f64,
    sale_price: f64,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            category: category.to_string(),
            initial_stock,
            cost_price,
            sale_price,
        },
    )
    .await
}

/// Sets up a closed store with one default product.
/// Returns (db, product) for catalog tests.
pub async fn setup_with_product() -> Result<(DatabaseConnection, entities::product::Model)> {
    let db = setup_test_db().await?;
    let product = create_test_product(&db, "Test Product").await?;
    Ok((db, product))
}

/// Sets up an open store with one default product.
/// Returns (db, product) for ledger tests.
pub async fn setup_open_store_with_product()
-> Result<(DatabaseConnection, entities::product::Model)> {
    let db = setup_open_store().await?;
    let product = create_test_product(&db, "Test Product").await?;
    Ok((db, product))
}
