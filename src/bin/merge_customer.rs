// src/bin/merge_customer.rs
//
// Applies a single operator-approved merge: re-points all transactional rows
// from the source customer to the target and flags the source as merged.

use anyhow::{bail, Context, Result};
use log::info;

use warehouse_dedupe_lib::{db, merge};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("Usage: merge_customer <source_customer_id> <target_customer_id>");
    }
    let source_id = &args[1];
    let target_id = &args[2];

    db::load_env();
    let pool = db::connect()
        .await
        .context("Failed to connect to database")?;

    let updated = merge::merge_customers(&pool, source_id, target_id).await?;
    info!(
        "Merged customer {} into {}; re-pointed {} transactional rows",
        source_id, target_id, updated
    );
    println!("{}", updated);
    Ok(())
}
