//! Reporting business logic - Cash and profit rollups over recorded sales.
//!
//! Everything here is read-only and recomputed from the stored sales on each
//! call. Category totals group by the category captured on each sale, so
//! re-categorizing a product later does not move its history.

use crate::{
    core::{catalog, ledger},
    entities::sale,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    /// Number of sales (units sold)
    pub count: u64,
    /// Cash taken
    pub cash: f64,
    /// Profit earned
    pub profit: f64,
}

/// Everything a closing-time review needs in one structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Number of sales recorded
    pub sale_count: u64,
    /// Sum of `unit_sale_price` over all sales
    pub total_cash: f64,
    /// Sum of `unit_cost_price` over all sales
    pub total_cost: f64,
    /// `total_cash - total_cost`
    pub total_profit: f64,
    /// Per-category totals keyed by the category captured at sale time
    pub by_category: BTreeMap<String, CategoryTotals>,
}

/// Builds a summary from an already loaded list of sales.
#[must_use]
pub fn summarize_sales(sales: &[sale::Model]) -> SalesSummary {
    let mut summary = SalesSummary::default();

    for sale in sales {
        summary.sale_count += 1;
        summary.total_cash += sale.revenue();
        summary.total_cost += sale.unit_cost_price;

        let totals = summary.by_category.entry(sale.category.clone()).or_default();
        totals.count += 1;
        totals.cash += sale.revenue();
        totals.profit += sale.profit();
    }
    summary.total_profit = summary.total_cash - summary.total_cost;

    summary
}

/// Summarizes every sale recorded so far.
pub async fn summarize(db: &DatabaseConnection) -> Result<SalesSummary> {
    let sales = ledger::list_sales(db).await?;
    Ok(summarize_sales(&sales))
}

/// Sum of `unit_sale_price` over all sales.
pub async fn total_cash(db: &DatabaseConnection) -> Result<f64> {
    Ok(summarize(db).await?.total_cash)
}

/// Sum of `unit_sale_price - unit_cost_price` over all sales.
pub async fn total_profit(db: &DatabaseConnection) -> Result<f64> {
    Ok(summarize(db).await?.total_profit)
}

/// Count, cash and profit per category captured at sale time.
pub async fn by_category(db: &DatabaseConnection) -> Result<BTreeMap<String, CategoryTotals>> {
    Ok(summarize(db).await?.by_category)
}

/// Cost value of the stock still on hand: `sum(available * cost_price)`.
pub async fn inventory_value(db: &DatabaseConnection) -> Result<f64> {
    let products = catalog::list_products(db).await?;
    #[allow(clippy::cast_precision_loss)]
    let value: f64 = products
        .iter()
        .map(|p| p.available() as f64 * p.cost_price)
        .sum();
    Ok(value)
}

/// Formats an amount with the shop's currency label, e.g. `"Bs 12.50"`.
#[must_use]
pub fn format_amount(amount: f64, currency: &str) -> String {
    if amount < 0.0 {
        format!("-{currency} {:.2}", amount.abs())
    } else {
        format!("{currency} {amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::catalog::ProductEdit;
    use crate::core::ledger::record_sale;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_empty_ledger_reports_zero() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(total_cash(&db).await?, 0.0);
        assert_eq!(total_profit(&db).await?, 0.0);
        assert!(by_category(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_totals_match_recorded_sales() -> Result<()> {
        let db = setup_open_store().await?;
        let tea = create_custom_product(&db, "Tea", "Beverages", 10, 1.5, 2.5).await?;
        let soap = create_custom_product(&db, "Soap", "Home", 10, 2.0, 3.0).await?;

        record_sale(&db, tea.id).await?;
        record_sale(&db, tea.id).await?;
        record_sale(&db, soap.id).await?;

        let sales = ledger::list_sales(&db).await?;
        let cash: f64 = sales.iter().map(|s| s.unit_sale_price).sum();
        let cost: f64 = sales.iter().map(|s| s.unit_cost_price).sum();

        assert_eq!(total_cash(&db).await?, cash);
        assert_eq!(total_cash(&db).await?, 8.0);
        assert_eq!(total_profit(&db).await?, cash - cost);
        assert_eq!(total_profit(&db).await?, 3.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_by_category_uses_sale_snapshot() -> Result<()> {
        let db = setup_open_store().await?;
        let juice = create_custom_product(&db, "Juice", "Beverages", 10, 1.0, 2.0).await?;

        record_sale(&db, juice.id).await?;
        crate::core::catalog::edit_product(
            &db,
            juice.id,
            ProductEdit {
                category: Some("Breakfast".to_string()),
                ..Default::default()
            },
        )
        .await?;
        record_sale(&db, juice.id).await?;

        let categories = by_category(&db).await?;
        assert_eq!(categories.len(), 2);
        assert_eq!(
            categories["Beverages"],
            CategoryTotals {
                count: 1,
                cash: 2.0,
                profit: 1.0
            }
        );
        assert_eq!(categories["Breakfast"].count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_inventory_value() -> Result<()> {
        let db = setup_open_store().await?;
        let rice = create_custom_product(&db, "Rice", "Groceries", 4, 2.5, 3.0).await?;
        create_custom_product(&db, "Salt", "Groceries", 2, 1.0, 1.5).await?;

        assert_eq!(inventory_value(&db).await?, 12.0);

        record_sale(&db, rice.id).await?;
        assert_eq!(inventory_value(&db).await?, 9.5);
        Ok(())
    }

    #[test]
    fn test_summarize_sales_groups_and_sums() {
        let now = chrono::Utc::now();
        let make = |id, category: &str, sale_price, cost_price| sale::Model {
            id,
            product_id: 1,
            product_name: "X".to_string(),
            category: category.to_string(),
            timestamp: now,
            unit_sale_price: sale_price,
            unit_cost_price: cost_price,
        };
        let sales = vec![make(1, "A", 10.0, 6.0), make(2, "B", 5.0, 5.0), make(3, "A", 2.0, 1.0)];

        let summary = summarize_sales(&sales);
        assert_eq!(summary.sale_count, 3);
        assert_eq!(summary.total_cash, 17.0);
        assert_eq!(summary.total_cost, 12.0);
        assert_eq!(summary.total_profit, 5.0);
        assert_eq!(summary.by_category["A"].count, 2);
        assert_eq!(summary.by_category["A"].profit, 5.0);
        assert_eq!(summary.by_category["B"].profit, 0.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(12.5, "Bs"), "Bs 12.50");
        assert_eq!(format_amount(0.0, "$"), "$ 0.00");
        assert_eq!(format_amount(-3.456, "Bs"), "-Bs 3.46");
    }
}
