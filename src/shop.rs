//! Shop facade - the command/query surface a presentation layer talks to.
//!
//! `Shop` holds the shared database connection and the sale retry policy and
//! forwards each command or query to the matching `core` function. It is cheap
//! to clone; clones share the same connection pool.

use crate::{
    core::{
        activity,
        catalog::{self, NewProduct, ProductEdit},
        ledger,
        report::{self, CategoryTotals, SalesSummary},
        retry::RetryPolicy,
        store_gate,
    },
    entities::{ActivityLogModel, ProductModel, SaleModel},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;

/// Shared state available to every shop operation.
#[derive(Clone, Debug)]
pub struct Shop {
    /// Database connection for all operations
    pub database: DatabaseConnection,
    retry: RetryPolicy,
}

impl Shop {
    /// Creates a new `Shop` over an initialized database.
    #[must_use]
    pub const fn new(database: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { database, retry }
    }

    // Catalog

    /// See [`catalog::create_product`].
    pub async fn create_product(&self, new: NewProduct) -> Result<ProductModel> {
        catalog::create_product(&self.database, new).await
    }

    /// See [`catalog::restock`].
    pub async fn restock(&self, product_id: i64, quantity: i64) -> Result<ProductModel> {
        catalog::restock(&self.database, product_id, quantity).await
    }

    /// See [`catalog::edit_product`].
    pub async fn edit_product(&self, product_id: i64, edit: ProductEdit) -> Result<ProductModel> {
        catalog::edit_product(&self.database, product_id, edit).await
    }

    /// See [`catalog::delete_product`].
    pub async fn delete_product(&self, product_id: i64) -> Result<ProductModel> {
        catalog::delete_product(&self.database, product_id).await
    }

    /// See [`catalog::available`].
    pub async fn available(&self, product_id: i64) -> Result<i64> {
        catalog::available(&self.database, product_id).await
    }

    /// See [`catalog::list_products`].
    pub async fn products(&self) -> Result<Vec<ProductModel>> {
        catalog::list_products(&self.database).await
    }

    /// See [`catalog::get_product_by_name`].
    pub async fn find_product(&self, name: &str) -> Result<Option<ProductModel>> {
        catalog::get_product_by_name(&self.database, name).await
    }

    // Store gate

    /// See [`store_gate::open_store`].
    pub async fn open_store(&self) -> Result<bool> {
        store_gate::open_store(&self.database).await
    }

    /// See [`store_gate::close_store`].
    pub async fn close_store(&self) -> Result<bool> {
        store_gate::close_store(&self.database).await
    }

    /// See [`store_gate::is_open`].
    pub async fn is_open(&self) -> Result<bool> {
        store_gate::is_open(&self.database).await
    }

    // Ledger

    /// Sells one unit using this shop's retry policy. See [`ledger::record_sale_with_policy`].
    pub async fn record_sale(&self, product_id: i64) -> Result<SaleModel> {
        ledger::record_sale_with_policy(&self.database, product_id, &self.retry).await
    }

    /// See [`ledger::list_sales`].
    pub async fn sales(&self) -> Result<Vec<SaleModel>> {
        ledger::list_sales(&self.database).await
    }

    // Activity log

    /// See [`activity::recent`].
    pub async fn recent(&self, limit: u64) -> Result<Vec<ActivityLogModel>> {
        activity::recent(&self.database, limit).await
    }

    // Reports

    /// See [`report::total_cash`].
    pub async fn total_cash(&self) -> Result<f64> {
        report::total_cash(&self.database).await
    }

    /// See [`report::total_profit`].
    pub async fn total_profit(&self) -> Result<f64> {
        report::total_profit(&self.database).await
    }

    /// See [`report::by_category`].
    pub async fn by_category(&self) -> Result<BTreeMap<String, CategoryTotals>> {
        report::by_category(&self.database).await
    }

    /// See [`report::summarize`].
    pub async fn summary(&self) -> Result<SalesSummary> {
        report::summarize(&self.database).await
    }
}
