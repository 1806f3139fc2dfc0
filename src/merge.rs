// src/merge.rs
//
// Folds a duplicate customer record into its surviving counterpart. All
// transactional rows are re-pointed and the source is flagged inside one
// database transaction; a failure at any step rolls the whole merge back.

use anyhow::{bail, Context, Result};
use log::{debug, info};

use crate::db::PgPool;

/// Merges the customer `source_id` into `target_id`.
///
/// Re-points every invoice and sales-line row from the source to the target,
/// then marks the source record with `merged_into` and archives it. Returns
/// the total number of transactional rows rewritten.
///
/// Repeating a committed merge with the same target is a no-op returning 0.
/// A self-merge, an unknown id, or a source already merged elsewhere is
/// rejected before anything is written.
pub async fn merge_customers(pool: &PgPool, source_id: &str, target_id: &str) -> Result<u64> {
    if source_id == target_id {
        bail!("Cannot merge customer '{}' into itself", source_id);
    }

    let mut conn = pool
        .get()
        .await
        .context("Merge: failed to get DB connection")?;
    let transaction = conn
        .transaction()
        .await
        .context("Merge: failed to start transaction")?;

    let source_row = transaction
        .query_opt(
            "SELECT merged_into FROM dw.dim_customer WHERE customer_id = $1",
            &[&source_id],
        )
        .await
        .context("Merge: failed to look up source customer")?;
    let Some(source_row) = source_row else {
        bail!("Merge source customer '{}' does not exist", source_id);
    };
    match source_row.get::<_, Option<String>>("merged_into") {
        Some(existing) if existing == target_id => {
            info!(
                "Customer {} is already merged into {}; nothing to re-point",
                source_id, target_id
            );
            return Ok(0);
        }
        Some(existing) => bail!(
            "Customer '{}' is already merged into '{}'; refusing to re-merge into '{}'",
            source_id,
            existing,
            target_id
        ),
        None => {}
    }

    let target_exists = transaction
        .query_opt(
            "SELECT 1 FROM dw.dim_customer WHERE customer_id = $1",
            &[&target_id],
        )
        .await
        .context("Merge: failed to look up target customer")?;
    if target_exists.is_none() {
        bail!("Merge target customer '{}' does not exist", target_id);
    }

    let invoice_rows = transaction
        .execute(
            "UPDATE dw.fct_invoice SET customer_id = $1 WHERE customer_id = $2",
            &[&target_id, &source_id],
        )
        .await
        .context("Merge: failed to re-point invoice rows")?;
    let sales_rows = transaction
        .execute(
            "UPDATE dw.fct_sales_line SET customer_id = $1 WHERE customer_id = $2",
            &[&target_id, &source_id],
        )
        .await
        .context("Merge: failed to re-point sales line rows")?;
    transaction
        .execute(
            "UPDATE dw.dim_customer SET merged_into = $1, archived = true WHERE customer_id = $2",
            &[&target_id, &source_id],
        )
        .await
        .context("Merge: failed to mark source customer as merged")?;

    transaction
        .commit()
        .await
        .context("Merge: failed to commit")?;

    debug!(
        "Merge {} -> {}: re-pointed {} invoice and {} sales line rows",
        source_id, target_id, invoice_rows, sales_rows
    );
    Ok(invoice_rows + sales_rows)
}
