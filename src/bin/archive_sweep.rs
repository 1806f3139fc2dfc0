// src/bin/archive_sweep.rs
//
// Previews a cutoff-date archive pass over customers and products, and
// applies it when --apply is given.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::info;

use warehouse_dedupe_lib::{archive, db};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    let apply = args.iter().any(|a| a == "--apply");
    let Some(cutoff_arg) = args.iter().skip(1).find(|a| !a.starts_with("--")) else {
        bail!("Usage: archive_sweep <cutoff-date YYYY-MM-DD> [--apply]");
    };
    let cutoff = NaiveDate::parse_from_str(cutoff_arg, "%Y-%m-%d")
        .with_context(|| format!("Invalid cutoff date '{}'", cutoff_arg))?;

    db::load_env();
    let pool = db::connect()
        .await
        .context("Failed to connect to database")?;
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection")?;

    let (customer_count, product_count) = archive::preview_archive(&*conn, cutoff).await?;
    info!(
        "Cutoff {}: {} customers and {} products have had no activity",
        cutoff, customer_count, product_count
    );

    let customers = archive::customers_to_archive(&*conn, cutoff).await?;
    for c in &customers {
        println!("customer {:<40} {}", c.customer_id, c.customer_name);
    }
    let products = archive::products_to_archive(&*conn, cutoff).await?;
    for p in &products {
        println!("product  {:<40} {}", p.product_id, p.item_name);
    }

    if apply {
        let archived_customers = archive::archive_customers_by_cutoff(&*conn, cutoff).await?;
        let archived_products = archive::archive_products_by_cutoff(&*conn, cutoff).await?;
        info!(
            "Archived {} customers and {} products",
            archived_customers, archived_products
        );
    } else {
        info!("Preview only; re-run with --apply to archive these records");
    }
    Ok(())
}
