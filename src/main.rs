use shopkeeper::{
    Shop,
    config::{database, shop as shop_config},
    core::{
        catalog::{self, NewProduct},
        report, store_gate,
    },
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load the shop configuration
    let config = shop_config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema and store state exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    store_gate::ensure_initialized(&db).await?;
    info!("Database initialized successfully.");

    // 5. Seed the starter catalog
    let seeds: Vec<NewProduct> = config.products.iter().map(NewProduct::from).collect();
    catalog::seed_products(&db, &seeds).await?;

    let shop = Shop::new(db, config.ledger.retry_policy());
    print_status(&shop, &config.shop).await
}

async fn print_status(shop: &Shop, settings: &shop_config::ShopConfig) -> Result<()> {
    let currency = settings.currency.as_str();
    let state = if shop.is_open().await? { "OPEN" } else { "CLOSED" };
    println!("{} ({state})", settings.name);

    println!("\nInventory");
    for product in shop.products().await? {
        println!(
            "  {:<24} {:<16} {:>5} available  {}  margin {}",
            product.name,
            product.category,
            product.available(),
            report::format_amount(product.sale_price, currency),
            report::format_amount(product.unit_margin(), currency)
        );
    }

    let summary = shop.summary().await?;
    println!("\nSales: {}", summary.sale_count);
    println!("  Cash:   {}", report::format_amount(summary.total_cash, currency));
    println!("  Profit: {}", report::format_amount(summary.total_profit, currency));
    for (category, totals) in &summary.by_category {
        println!(
            "  {:<16} {:>5} sold  {}  profit {}",
            category,
            totals.count,
            report::format_amount(totals.cash, currency),
            report::format_amount(totals.profit, currency)
        );
    }

    println!("\nRecent activity");
    for entry in shop.recent(10).await? {
        println!(
            "  {}  {:<16} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.kind,
            entry.description
        );
    }

    Ok(())
}
