//! Purchase-gated product reviews.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ShopError, ShopResult};
use crate::ledger::PurchaseLedger;
use crate::models::Comment;
use crate::storage::{BlobStore, FileUpload};

pub const REVIEW_IMAGE_DIR: &str = "uploads/comments";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitReview {
    pub product_item_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
}

#[derive(Clone)]
pub struct ReviewGate<B: BlobStore> {
    pool: PgPool,
    ledger: PurchaseLedger,
    blobs: B,
}

impl<B: BlobStore> ReviewGate<B> {
    pub fn new(pool: PgPool, ledger: PurchaseLedger, blobs: B) -> Self {
        Self { pool, ledger, blobs }
    }

    /// At most one review per (user, SKU), and only after a completed
    /// purchase of that SKU.
    pub async fn submit(
        &self,
        user_id: Uuid,
        input: SubmitReview,
        image: Option<FileUpload>,
    ) -> ShopResult<Comment> {
        input.validate()?;
        if let Some(upload) = &image {
            upload.validate_image()?;
        }

        let sku_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM product_items WHERE id = $1)")
                .bind(input.product_item_id)
                .fetch_one(&self.pool)
                .await?;
        if !sku_exists {
            return Err(ShopError::NotFound("product item"));
        }

        if !self
            .ledger
            .has_completed_purchase(user_id, input.product_item_id)
            .await?
        {
            return Err(ShopError::forbidden(
                "you have not purchased this product or the order is not completed",
            ));
        }

        let already_reviewed: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM comments WHERE user_id = $1 AND product_item_id = $2)",
        )
        .bind(user_id)
        .bind(input.product_item_id)
        .fetch_one(&self.pool)
        .await?;
        if already_reviewed {
            return Err(ShopError::forbidden("you have already reviewed this product"));
        }

        let stored_image = match image {
            Some(upload) => Some(self.blobs.store(upload, REVIEW_IMAGE_DIR).await?),
            None => None,
        };

        // Concurrent submits for the same (user, SKU) are resolved by the
        // unique constraint; the violation maps back to the same Forbidden.
        let review: Comment = sqlx::query_as(
            "INSERT INTO comments (id, product_item_id, user_id, content, rating, image, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.product_item_id)
        .bind(user_id)
        .bind(&input.content)
        .bind(input.rating)
        .bind(&stored_image)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    /// Deletes a review; only its author may do so.
    pub async fn delete(&self, requester: Uuid, review_id: Uuid) -> ShopResult<()> {
        let review: Option<Comment> = sqlx::query_as("SELECT * FROM comments WHERE id = $1")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;
        let review = review.ok_or(ShopError::NotFound("comment"))?;
        if review.user_id != requester {
            return Err(ShopError::forbidden("you cannot delete another user's review"));
        }
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All reviews across a product's SKUs. Public.
    pub async fn list_for_product(&self, product_id: Uuid) -> ShopResult<Vec<Comment>> {
        let comments: Vec<Comment> = sqlx::query_as(
            "SELECT c.* FROM comments c \
             JOIN product_items i ON i.id = c.product_item_id \
             WHERE i.product_id = $1 \
             ORDER BY c.created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> ShopResult<Vec<Comment>> {
        let comments: Vec<Comment> = sqlx::query_as(
            "SELECT * FROM comments WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(content: String, rating: i32) -> SubmitReview {
        SubmitReview {
            product_item_id: Uuid::new_v4(),
            content,
            rating,
        }
    }

    #[test]
    fn content_capped_at_500_chars() {
        assert!(submission("x".repeat(500), 3).validate().is_ok());
        assert!(submission("x".repeat(501), 3).validate().is_err());
        assert!(submission(String::new(), 3).validate().is_err());
    }

    #[test]
    fn rating_must_be_one_through_five() {
        for rating in 1..=5 {
            assert!(submission("good".into(), rating).validate().is_ok());
        }
        assert!(submission("good".into(), 0).validate().is_err());
        assert!(submission("good".into(), 6).validate().is_err());
    }
}
