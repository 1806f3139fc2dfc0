// src/archive.rs
//
// Archive/restore lifecycle for customer and product master records. A record
// is eligible for archiving when no transactional row carries its id on or
// after the cutoff date. Archiving is a soft flag; restoring clears it.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use futures::future;
use log::info;
use tokio_postgres::types::ToSql;
use tokio_postgres::GenericClient;

use crate::dimensions::{customer_from_row, product_from_row};
use crate::models::{CustomerRecord, ProductRecord};

/// Counts how many customers and products a cutoff-date archive pass would
/// touch. Read-only; the two counts run pipelined on one connection.
pub async fn preview_archive(
    client: &impl GenericClient,
    cutoff: NaiveDate,
) -> Result<(u64, u64)> {
    let params: [&(dyn ToSql + Sync); 1] = [&cutoff];
    let customers = client.query_one(
        "SELECT COUNT(*) AS cnt FROM dw.dim_customer c
         WHERE (c.archived = false OR c.archived IS NULL)
         AND NOT EXISTS (
             SELECT 1 FROM dw.fct_invoice i
             WHERE i.customer_id = c.customer_id AND i.invoice_date >= $1
         )
         AND NOT EXISTS (
             SELECT 1 FROM dw.fct_sales_line s
             WHERE s.customer_id = c.customer_id AND s.invoice_date >= $1
         )",
        &params,
    );
    let products = client.query_one(
        "SELECT COUNT(*) AS cnt FROM dw.dim_product p
         WHERE (p.archived = false OR p.archived IS NULL)
         AND NOT EXISTS (
             SELECT 1 FROM dw.fct_sales_line s
             WHERE s.product_id = p.product_id AND s.invoice_date >= $1
         )",
        &params,
    );
    let (customer_row, product_row) = future::try_join(customers, products)
        .await
        .context("Failed to count archive candidates")?;
    Ok((
        customer_row.get::<_, i64>("cnt") as u64,
        product_row.get::<_, i64>("cnt") as u64,
    ))
}

/// Full customer rows the cutoff predicate would archive, for operator review
/// and manual exclusion.
pub async fn customers_to_archive(
    client: &impl GenericClient,
    cutoff: NaiveDate,
) -> Result<Vec<CustomerRecord>> {
    let rows = client
        .query(
            "SELECT c.customer_id, c.customer_name, c.market, c.merchant_group,
                    c.archived, c.merged_into
             FROM dw.dim_customer c
             WHERE (c.archived = false OR c.archived IS NULL)
             AND NOT EXISTS (
                 SELECT 1 FROM dw.fct_invoice i
                 WHERE i.customer_id = c.customer_id AND i.invoice_date >= $1
             )
             AND NOT EXISTS (
                 SELECT 1 FROM dw.fct_sales_line s
                 WHERE s.customer_id = c.customer_id AND s.invoice_date >= $1
             )
             ORDER BY c.customer_name",
            &[&cutoff],
        )
        .await
        .context("Failed to list customers to archive")?;
    Ok(rows.iter().map(customer_from_row).collect())
}

pub async fn products_to_archive(
    client: &impl GenericClient,
    cutoff: NaiveDate,
) -> Result<Vec<ProductRecord>> {
    let rows = client
        .query(
            "SELECT p.product_id, p.product_code, p.item_name, p.product_group, p.archived
             FROM dw.dim_product p
             WHERE (p.archived = false OR p.archived IS NULL)
             AND NOT EXISTS (
                 SELECT 1 FROM dw.fct_sales_line s
                 WHERE s.product_id = p.product_id AND s.invoice_date >= $1
             )
             ORDER BY p.item_name",
            &[&cutoff],
        )
        .await
        .context("Failed to list products to archive")?;
    Ok(rows.iter().map(product_from_row).collect())
}

/// Archives exactly the given customers. An empty id set is a no-op.
pub async fn archive_customers(
    client: &impl GenericClient,
    customer_ids: &[String],
) -> Result<u64> {
    if customer_ids.is_empty() {
        return Ok(0);
    }
    let archived = client
        .execute(
            "UPDATE dw.dim_customer SET archived = true WHERE customer_id = ANY($1)",
            &[&customer_ids],
        )
        .await
        .context("Failed to archive customers by id")?;
    info!("Archived {} customers by explicit id list", archived);
    Ok(archived)
}

/// Archives exactly the given products. An empty id set is a no-op.
pub async fn archive_products(client: &impl GenericClient, product_ids: &[i32]) -> Result<u64> {
    if product_ids.is_empty() {
        return Ok(0);
    }
    let archived = client
        .execute(
            "UPDATE dw.dim_product SET archived = true WHERE product_id = ANY($1)",
            &[&product_ids],
        )
        .await
        .context("Failed to archive products by id")?;
    info!("Archived {} products by explicit id list", archived);
    Ok(archived)
}

/// Archives every unarchived customer with no transactional activity on or
/// after the cutoff date.
pub async fn archive_customers_by_cutoff(
    client: &impl GenericClient,
    cutoff: NaiveDate,
) -> Result<u64> {
    let archived = client
        .execute(
            "UPDATE dw.dim_customer c
             SET archived = true
             WHERE (c.archived = false OR c.archived IS NULL)
             AND NOT EXISTS (
                 SELECT 1 FROM dw.fct_invoice i
                 WHERE i.customer_id = c.customer_id AND i.invoice_date >= $1
             )
             AND NOT EXISTS (
                 SELECT 1 FROM dw.fct_sales_line s
                 WHERE s.customer_id = c.customer_id AND s.invoice_date >= $1
             )",
            &[&cutoff],
        )
        .await
        .context("Failed to archive customers by cutoff date")?;
    info!("Archived {} customers inactive since {}", archived, cutoff);
    Ok(archived)
}

/// Archives every unarchived product with no sales activity on or after the
/// cutoff date.
pub async fn archive_products_by_cutoff(
    client: &impl GenericClient,
    cutoff: NaiveDate,
) -> Result<u64> {
    let archived = client
        .execute(
            "UPDATE dw.dim_product p
             SET archived = true
             WHERE (p.archived = false OR p.archived IS NULL)
             AND NOT EXISTS (
                 SELECT 1 FROM dw.fct_sales_line s
                 WHERE s.product_id = p.product_id AND s.invoice_date >= $1
             )",
            &[&cutoff],
        )
        .await
        .context("Failed to archive products by cutoff date")?;
    info!("Archived {} products inactive since {}", archived, cutoff);
    Ok(archived)
}

/// Clears the archive flag on one customer. Returns false when the id is
/// unknown. A customer that was merged away cannot be restored: its
/// transactional history now lives on the surviving record.
pub async fn unarchive_customer(client: &impl GenericClient, customer_id: &str) -> Result<bool> {
    let row = client
        .query_opt(
            "SELECT merged_into FROM dw.dim_customer WHERE customer_id = $1",
            &[&customer_id],
        )
        .await
        .context("Failed to look up customer for restore")?;
    let Some(row) = row else {
        return Ok(false);
    };
    if let Some(target) = row.get::<_, Option<String>>("merged_into") {
        bail!(
            "Customer '{}' was merged into '{}' and cannot be restored",
            customer_id,
            target
        );
    }

    let updated = client
        .execute(
            "UPDATE dw.dim_customer SET archived = false WHERE customer_id = $1",
            &[&customer_id],
        )
        .await
        .context("Failed to restore customer")?;
    Ok(updated > 0)
}

/// Clears the archive flag on one product. Returns false when the id is
/// unknown.
pub async fn unarchive_product(client: &impl GenericClient, product_id: i32) -> Result<bool> {
    let updated = client
        .execute(
            "UPDATE dw.dim_product SET archived = false WHERE product_id = $1",
            &[&product_id],
        )
        .await
        .context("Failed to restore product")?;
    Ok(updated > 0)
}
