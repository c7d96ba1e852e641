//! Sales and search-popularity statistics.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::sales::{self, ProductSales, SoldLine};
use crate::error::{ShopError, ShopResult};
use crate::models::{OrderStatus, Product};

#[derive(Clone)]
pub struct SalesStats {
    pool: PgPool,
}

impl SalesStats {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ranked per-product totals over completed orders in one calendar
    /// month (UTC).
    pub async fn top_selling_by_month(&self, year: i32, month: u32) -> ShopResult<Vec<ProductSales>> {
        let (start, end) = sales::month_window(year, month)
            .ok_or_else(|| ShopError::validation("invalid month"))?;
        // Inner joins drop lines whose SKU or product no longer resolves.
        let lines: Vec<SoldLine> = sqlx::query_as(
            "SELECT p.id AS product_id, p.name AS product_name, \
                    p.image_product AS product_image, d.quantity, d.price \
             FROM orders o \
             JOIN order_details d ON d.order_id = o.id \
             JOIN product_items i ON i.id = d.product_item_id \
             JOIN products p ON p.id = i.product_id \
             WHERE o.status = $1 AND o.created_at >= $2 AND o.created_at < $3 \
               AND p.deleted_at IS NULL",
        )
        .bind(OrderStatus::Completed)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales::accumulate(lines, year, month))
    }

    /// Bumps the product's search counter by one and stamps the search
    /// time, as a single atomic update.
    pub async fn record_search(&self, product_id: Uuid) -> ShopResult<Product> {
        let updated: Option<Product> = sqlx::query_as(
            "UPDATE products \
             SET search_count = search_count + 1, search_count_date = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(ShopError::NotFound("product"))
    }

    /// Live products searched during the month, most searched first. A
    /// month with no searches is reported as not-found.
    pub async fn top_searched(&self, year: i32, month: u32) -> ShopResult<Vec<Product>> {
        let (start, end) = sales::month_window(year, month)
            .ok_or_else(|| ShopError::validation("invalid month"))?;
        let products: Vec<Product> = sqlx::query_as(
            "SELECT * FROM products \
             WHERE deleted_at IS NULL \
               AND search_count_date >= $1 AND search_count_date < $2 \
             ORDER BY search_count DESC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        if products.is_empty() {
            return Err(ShopError::NotFound("searched products"));
        }
        Ok(products)
    }
}
