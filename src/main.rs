// src/main.rs
//
// Match-finding driver: partitions live customers into newly-imported and
// historical sets, scores them, and reports candidate duplicates for operator
// review. Pass a minimum score (default 0.5) and --json for machine output.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::{Duration, Instant};
use uuid::Uuid;

use warehouse_dedupe_lib::{db, dimensions, find_customer_matches, summarize_matches, DEFAULT_MIN_SCORE};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    let json_output = args.iter().any(|a| a == "--json");
    let min_score = match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(raw) => raw
            .parse::<f64>()
            .with_context(|| format!("Invalid minimum score '{}'", raw))?,
        None => DEFAULT_MIN_SCORE,
    };
    if !(0.0..=1.0).contains(&min_score) {
        bail!("Minimum score {} is outside [0, 1]", min_score);
    }

    let run_id = Uuid::new_v4();
    info!(
        "Starting customer match run {} (min score {:.2})",
        run_id, min_score
    );
    let start_time = Instant::now();

    db::load_env();
    let pool = db::connect()
        .await
        .context("Failed to connect to database")?;
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection")?;

    let (incoming, historical) = dimensions::fetch_customer_candidates(&*conn).await?;
    info!(
        "Loaded {} incoming and {} historical customer records",
        incoming.len(),
        historical.len()
    );
    if incoming.is_empty() || historical.is_empty() {
        info!("Nothing to match; one of the candidate sets is empty");
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Failed to set spinner style")?,
    );
    spinner.set_message(format!(
        "Scoring {} x {} customer name pairs...",
        incoming.len(),
        historical.len()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let matches = find_customer_matches(&incoming, &historical, min_score);
    spinner.finish_and_clear();

    let summary = summarize_matches(&matches);
    info!(
        "Match run {} finished in {:.2?}: {} matches ({} exact, {} high, {} medium, {} low), avg score {:.3}",
        run_id,
        start_time.elapsed(),
        summary.total,
        summary.exact,
        summary.high,
        summary.medium,
        summary.low,
        summary.avg_score
    );

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&matches).context("Failed to serialize matches")?
        );
    } else {
        for m in &matches {
            println!(
                "{:.3} [{:>6}] {} ({}) -> {} ({})",
                m.similarity_score, m.match_type, m.source_name, m.source_id, m.target_name, m.target_id
            );
        }
    }
    Ok(())
}
