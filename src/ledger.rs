//! Purchase ledger (read-only).
//!
//! Orders and their lines are written by the fulfilment pipeline; this
//! service only asks whether a completed purchase exists.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ShopResult;
use crate::models::OrderStatus;

#[derive(Clone)]
pub struct PurchaseLedger {
    pool: PgPool,
}

impl PurchaseLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether `user_id` has a completed order containing `product_item_id`.
    ///
    /// A presence check: the same SKU may appear in any number of the
    /// user's orders.
    pub async fn has_completed_purchase(
        &self,
        user_id: Uuid,
        product_item_id: Uuid,
    ) -> ShopResult<bool> {
        let purchased: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
               SELECT 1 FROM order_details d \
               JOIN orders o ON o.id = d.order_id \
               WHERE d.product_item_id = $1 AND o.user_id = $2 AND o.status = $3 )",
        )
        .bind(product_item_id)
        .bind(user_id)
        .bind(OrderStatus::Completed)
        .fetch_one(&self.pool)
        .await?;
        Ok(purchased)
    }
}
