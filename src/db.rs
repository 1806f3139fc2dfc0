// src/db.rs

use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::{debug, info, warn};
use std::path::Path;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Reads environment variables and constructs a PostgreSQL config.
fn build_pg_config() -> Config {
    let mut config = Config::new();
    let host = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port_str = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let port = port_str.parse::<u16>().unwrap_or(5432);
    let dbname = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "warehouse".to_string());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();

    info!(
        "DB Config: Host={}, Port={}, DB={}, User={}",
        host, port, dbname, user
    );
    config
        .host(&host)
        .port(port)
        .dbname(&dbname)
        .user(&user)
        .password(&password);
    config.application_name("warehouse_dedupe");
    config.connect_timeout(Duration::from_secs(10));
    config
}

/// Initializes the database connection pool.
///
/// The workflows here are operator-driven and infrequent, so the pool stays
/// small; each request-style operation checks a connection out for its own
/// unit of work.
pub async fn connect() -> Result<PgPool> {
    let config = build_pg_config();
    info!("Connecting to PostgreSQL warehouse...");
    let manager = PostgresConnectionManager::new(config, NoTls);

    let pool = Pool::builder()
        .max_size(8)
        .min_idle(Some(1))
        .idle_timeout(Some(Duration::from_secs(180)))
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    // Test connection
    let conn = pool
        .get()
        .await
        .context("Failed to get test connection from pool")?;
    conn.query_one("SELECT 1", &[])
        .await
        .context("Test query 'SELECT 1' failed")?;
    info!("Database connection pool initialized successfully.");
    Ok(pool.clone())
}

/// Loads environment variables from a .env file.
pub fn load_env_from_file(file_path: &str) -> Result<()> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open(file_path)
        .with_context(|| format!("Could not open env file '{}'", file_path))?;
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line.context("Failed to read line from env file")?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        if let Some(idx) = line.find('=') {
            let key = line[..idx].trim();
            let value = line[idx + 1..].trim().trim_matches('"');
            if std::env::var(key).is_err() {
                // Set only if not already set
                std::env::set_var(key, value);
                debug!(
                    "Set env var from file: {} = {}",
                    key,
                    if key == "POSTGRES_PASSWORD" {
                        "[hidden]"
                    } else {
                        value
                    }
                );
            }
        }
    }
    info!("Successfully processed env file: {}", file_path);
    Ok(())
}

/// Probes the usual .env locations and loads the first one found. Missing
/// files are not an error; the system environment still applies.
pub fn load_env() {
    let env_paths = [".env", ".env.local", "../.env"];
    for path in env_paths.iter() {
        if Path::new(path).exists() {
            match load_env_from_file(path) {
                Ok(()) => {
                    info!("Loaded environment variables from {}", path);
                    return;
                }
                Err(e) => warn!("Failed to load environment from {}: {}", path, e),
            }
        }
    }
    info!("No .env file found, using environment variables from system");
}
