use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;

use price_tracker::application::{ProductService, ScraperRegistry};
use price_tracker::domain::Product;
use price_tracker::infrastructure::logging::{init_logging_with_config, log_system_info};
use price_tracker::infrastructure::{ConfigManager, JsonFileProductStore, config::defaults};

/// Track marketplace product prices
#[derive(Parser, Debug)]
#[command(name = "price-tracker", version, about)]
struct Cli {
    /// Configuration environment, read from configs/<env>/config.json
    #[arg(long, default_value = defaults::ENVIRONMENT)]
    env: String,

    /// URL of the product to track
    #[arg(long)]
    url: Option<String>,

    /// Search for products with this keyword
    #[arg(long)]
    search: Option<String>,

    /// Website to scrape
    #[arg(long, default_value = "rakuten")]
    website: String,

    /// Maximum number of search results
    #[arg(long = "max", default_value_t = defaults::MAX_RESULTS)]
    max_results: usize,

    /// Directory to store data, overrides the configured one
    #[arg(long = "data")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.url.is_none() && cli.search.is_none() {
        Cli::command().print_help()?;
        std::process::exit(1);
    }

    let mut config = ConfigManager::for_env(&cli.env).load_config().await?;
    if let Some(data_dir) = cli.data_dir {
        config.data.dir = data_dir;
    }

    init_logging_with_config(&config.logging)?;
    log_system_info();

    tokio::fs::create_dir_all(&config.data.dir)
        .await
        .with_context(|| format!("Failed to create data directory {:?}", config.data.dir))?;

    let store = JsonFileProductStore::open(config.data.snapshot_path())
        .await
        .context("Failed to initialize storage")?;
    let registry = ScraperRegistry::with_defaults(&config.scraping)?;
    let service = ProductService::new(Arc::new(registry), Arc::new(store))
        .with_default_max_results(config.api.max_results);

    if let Some(url) = cli.url {
        println!("Scraping product from URL: {url}");
        let product = service
            .scrape_product(&url, &cli.website)
            .await
            .context("Failed to scrape product")?;

        print_product(&product);
        println!("Product saved successfully!");
    } else if let Some(keyword) = cli.search {
        println!(
            "Searching for '{keyword}' on {} (max: {} results)",
            cli.website, cli.max_results
        );
        let products = service
            .scrape_search(&keyword, &cli.website, Some(cli.max_results))
            .await
            .context("Failed to search for products")?;

        println!("Found {} products:", products.len());
        for (i, product) in products.iter().enumerate() {
            println!("\n--- Product {} ---", i + 1);
            print_product(product);
        }
    }

    Ok(())
}

fn print_product(product: &Product) {
    println!("ID: {}", product.id);
    println!("Name: {}", product.name);
    println!("URL: {}", product.url);
    println!("Price: {:.2} {}", product.current_price(), product.currency());
    println!("Image URL: {}", product.image_url);
    if product.description.chars().count() > 100 {
        let short: String = product.description.chars().take(100).collect();
        println!("Description: {short}...");
    } else {
        println!("Description: {}", product.description);
    }
    println!("Last Updated: {}", product.last_updated().to_rfc2822());
}
