// src/dimensions.rs
//
// Access to the dw.dim_customer / dw.dim_product dimension tables. All row
// data stays in the warehouse; these helpers only materialize typed records
// for the lifetime of one operation.

use anyhow::{Context, Result};
use log::debug;
use tokio_postgres::{GenericClient, Row};
use uuid::Uuid;

use crate::models::{CustomerCandidate, CustomerRecord, ProductRecord};

/// Newly imported customers arrive from the accounting system keyed by a
/// hyphenated UUID; historical records keep their legacy short identifiers.
pub fn is_accounting_system_id(customer_id: &str) -> bool {
    customer_id.len() == 36 && Uuid::try_parse(customer_id).is_ok()
}

pub(crate) fn customer_from_row(row: &Row) -> CustomerRecord {
    CustomerRecord {
        customer_id: row.get("customer_id"),
        customer_name: row
            .get::<_, Option<String>>("customer_name")
            .unwrap_or_default(),
        market: row.get::<_, Option<String>>("market").unwrap_or_default(),
        merchant_group: row.get("merchant_group"),
        archived: row.get::<_, Option<bool>>("archived").unwrap_or(false),
        merged_into: row.get("merged_into"),
    }
}

pub(crate) fn product_from_row(row: &Row) -> ProductRecord {
    ProductRecord {
        product_id: row.get("product_id"),
        product_code: row
            .get::<_, Option<String>>("product_code")
            .unwrap_or_default(),
        item_name: row.get::<_, Option<String>>("item_name").unwrap_or_default(),
        product_group: row
            .get::<_, Option<String>>("product_group")
            .unwrap_or_default(),
        archived: row.get::<_, Option<bool>>("archived").unwrap_or(false),
    }
}

/// Loads all live customer `{id, name}` pairs and partitions them into
/// newly-imported vs historical candidate sets for the match finder.
pub async fn fetch_customer_candidates(
    client: &impl GenericClient,
) -> Result<(Vec<CustomerCandidate>, Vec<CustomerCandidate>)> {
    let rows = client
        .query(
            "SELECT customer_id, customer_name
             FROM dw.dim_customer
             WHERE archived = false OR archived IS NULL
             ORDER BY customer_name",
            &[],
        )
        .await
        .context("Failed to query customer candidates")?;

    let mut incoming = Vec::new();
    let mut historical = Vec::new();
    for row in &rows {
        let candidate = CustomerCandidate {
            customer_id: row.get("customer_id"),
            customer_name: row
                .get::<_, Option<String>>("customer_name")
                .unwrap_or_default(),
        };
        if is_accounting_system_id(&candidate.customer_id) {
            incoming.push(candidate);
        } else {
            historical.push(candidate);
        }
    }
    debug!(
        "Partitioned {} customers into {} incoming / {} historical candidates",
        rows.len(),
        incoming.len(),
        historical.len()
    );
    Ok((incoming, historical))
}

/// Customer records visible in active listings.
pub async fn fetch_active_customers(client: &impl GenericClient) -> Result<Vec<CustomerRecord>> {
    let rows = client
        .query(
            "SELECT customer_id, customer_name, market, merchant_group, archived, merged_into
             FROM dw.dim_customer
             WHERE archived = false OR archived IS NULL
             ORDER BY customer_name",
            &[],
        )
        .await
        .context("Failed to query active customers")?;
    Ok(rows.iter().map(customer_from_row).collect())
}

/// Archived customer records, including where each merged one now lives, for
/// the restore review screen.
pub async fn fetch_archived_customers(client: &impl GenericClient) -> Result<Vec<CustomerRecord>> {
    let rows = client
        .query(
            "SELECT customer_id, customer_name, market, merchant_group, archived, merged_into
             FROM dw.dim_customer
             WHERE archived = true
             ORDER BY customer_name",
            &[],
        )
        .await
        .context("Failed to query archived customers")?;
    Ok(rows.iter().map(customer_from_row).collect())
}

pub async fn fetch_products(client: &impl GenericClient) -> Result<Vec<ProductRecord>> {
    let rows = client
        .query(
            "SELECT product_id, product_code, item_name, product_group, archived
             FROM dw.dim_product
             ORDER BY item_name",
            &[],
        )
        .await
        .context("Failed to query products")?;
    Ok(rows.iter().map(product_from_row).collect())
}

/// Inserts or updates a customer dimension row keyed on its id.
pub async fn upsert_customer(client: &impl GenericClient, customer: &CustomerRecord) -> Result<()> {
    client
        .execute(
            "INSERT INTO dw.dim_customer (customer_id, customer_name, market, merchant_group)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (customer_id) DO UPDATE SET
                 customer_name = excluded.customer_name,
                 market = excluded.market,
                 merchant_group = excluded.merchant_group",
            &[
                &customer.customer_id,
                &customer.customer_name,
                &customer.market,
                &customer.merchant_group,
            ],
        )
        .await
        .with_context(|| format!("Failed to upsert customer {}", customer.customer_id))?;
    Ok(())
}

/// Inserts or updates a product dimension row keyed on its id.
pub async fn upsert_product(client: &impl GenericClient, product: &ProductRecord) -> Result<()> {
    client
        .execute(
            "INSERT INTO dw.dim_product (product_id, product_code, item_name, product_group)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (product_id) DO UPDATE SET
                 product_code = excluded.product_code,
                 item_name = excluded.item_name,
                 product_group = excluded.product_group",
            &[
                &product.product_id,
                &product.product_code,
                &product.item_name,
                &product.product_group,
            ],
        )
        .await
        .with_context(|| format!("Failed to upsert product {}", product.product_id))?;
    Ok(())
}

/// Next free numeric customer id for manually created records. Imported
/// UUID-keyed rows are excluded from the scan.
pub async fn next_customer_id(client: &impl GenericClient) -> Result<i64> {
    let row = client
        .query_one(
            "SELECT COALESCE(MAX(customer_id::bigint), 0) + 1 AS next_id
             FROM dw.dim_customer
             WHERE customer_id ~ '^[0-9]+$'",
            &[],
        )
        .await
        .context("Failed to allocate next customer id")?;
    Ok(row.get("next_id"))
}

pub async fn next_product_id(client: &impl GenericClient) -> Result<i32> {
    let row = client
        .query_one(
            "SELECT COALESCE(MAX(product_id), 0) + 1 AS next_id FROM dw.dim_product",
            &[],
        )
        .await
        .context("Failed to allocate next product id")?;
    Ok(row.get("next_id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounting_system_id_shape() {
        assert!(is_accounting_system_id(
            "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        ));
        assert!(!is_accounting_system_id("10482"));
        assert!(!is_accounting_system_id("CUST-001"));
        // Simple (un-hyphenated) hex form is a legacy id, not an import.
        assert!(!is_accounting_system_id("3fa85f6457174562b3fc2c963f66afa6"));
        assert!(!is_accounting_system_id(""));
    }
}
