//! Catalog store: products, their size/color SKUs, and categories.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::domain::variants;
use crate::error::{ShopError, ShopResult};
use crate::models::{Category, Page, Product, ProductItemDetail, ProductStatus, ProductWithVariants};

const PER_PAGE: i64 = 10;
const SHOP_PER_PAGE: i64 = 15;
const CATEGORY_PER_PAGE: i64 = 3;

/// Closed price-bracket enumeration over `price_sale`, in minor currency
/// units. Bounds are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "1m-2m")]
    OneToTwo,
    #[serde(rename = "2m-5m")]
    TwoToFive,
    #[serde(rename = "5m-10m")]
    FiveToTen,
}

impl PriceRange {
    pub fn bounds(self) -> (i64, i64) {
        match self {
            Self::OneToTwo => (1_000_000, 2_000_000),
            Self::TwoToFive => (2_000_000, 5_000_000),
            Self::FiveToTen => (5_000_000, 10_000_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub name: String,
    pub status: ProductStatus,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub price_sale: Option<i64>,
    pub image_product: Option<String>,
    pub image_description: Option<Vec<String>>,
    /// JSON-encoded array of variant groups.
    pub variants: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub name: Option<String>,
    pub status: Option<ProductStatus>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(range(min = 0))]
    pub price_sale: Option<i64>,
    pub image_product: Option<String>,
    pub image_description: Option<Vec<String>>,
}

fn check_sale_price(price: i64, price_sale: i64) -> ShopResult<()> {
    if price_sale > price {
        return Err(ShopError::validation(
            "price_sale cannot be greater than the original price",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the product and every SKU its variant groups expand to, as
    /// one transaction. Any failure leaves nothing behind.
    pub async fn create(&self, input: CreateProduct) -> ShopResult<ProductWithVariants> {
        input.validate()?;
        let groups = variants::parse_groups(&input.variants)?;
        let drafts = variants::expand(&groups)?;
        let price_sale = input.price_sale.unwrap_or(0);
        check_sale_price(input.price, price_sale)?;
        if !self.category_exists(input.category_id).await? {
            return Err(ShopError::validation("category does not exist"));
        }

        let mut tx = self.pool.begin().await?;
        let product: Product = sqlx::query_as(
            "INSERT INTO products \
               (id, category_id, title, name, status, description, price, price_sale, \
                image_product, image_description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.category_id)
        .bind(&input.title)
        .bind(&input.name)
        .bind(input.status)
        .bind(&input.description)
        .bind(input.price)
        .bind(price_sale)
        .bind(&input.image_product)
        .bind(input.image_description.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await?;

        for draft in &drafts {
            sqlx::query(
                "INSERT INTO product_items (id, product_id, size_id, color_id, quantity, type) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::now_v7())
            .bind(product.id)
            .bind(draft.size_id)
            .bind(draft.color_id)
            .bind(draft.quantity)
            .bind(&draft.kind)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let variants = self.variants_of(product.id).await?;
        Ok(ProductWithVariants { product, variants })
    }

    /// Live products, newest first, fixed page size.
    pub async fn list(&self, page: i64) -> ShopResult<Page<Product>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        let data: Vec<Product> = sqlx::query_as(
            "SELECT * FROM products WHERE deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(PER_PAGE)
        .bind((page - 1) * PER_PAGE)
        .fetch_all(&self.pool)
        .await?;
        Ok(Page::new(data, total, page, PER_PAGE))
    }

    pub async fn list_all(&self) -> ShopResult<Vec<Product>> {
        let products: Vec<Product> =
            sqlx::query_as("SELECT * FROM products WHERE deleted_at IS NULL ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    /// Shop listing filtered by category and/or price bracket.
    pub async fn shop_list(
        &self,
        page: i64,
        category_id: Option<Uuid>,
        price_range: Option<PriceRange>,
    ) -> ShopResult<Page<Product>> {
        let (low, high) = match price_range.map(PriceRange::bounds) {
            Some((low, high)) => (Some(low), Some(high)),
            None => (None, None),
        };
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE deleted_at IS NULL \
               AND ($1::uuid IS NULL OR category_id = $1) \
               AND ($2::bigint IS NULL OR price_sale BETWEEN $2 AND $3)",
        )
        .bind(category_id)
        .bind(low)
        .bind(high)
        .fetch_one(&self.pool)
        .await?;
        let data: Vec<Product> = sqlx::query_as(
            "SELECT * FROM products WHERE deleted_at IS NULL \
               AND ($1::uuid IS NULL OR category_id = $1) \
               AND ($2::bigint IS NULL OR price_sale BETWEEN $2 AND $3) \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        )
        .bind(category_id)
        .bind(low)
        .bind(high)
        .bind(SHOP_PER_PAGE)
        .bind((page - 1) * SHOP_PER_PAGE)
        .fetch_all(&self.pool)
        .await?;
        Ok(Page::new(data, total, page, SHOP_PER_PAGE))
    }

    /// Product with eager-loaded variants and their size/color names.
    pub async fn get(&self, id: Uuid) -> ShopResult<ProductWithVariants> {
        let product = self.get_basic(id).await?;
        let variants = self.variants_of(id).await?;
        Ok(ProductWithVariants { product, variants })
    }

    pub async fn get_basic(&self, id: Uuid) -> ShopResult<Product> {
        let product: Option<Product> =
            sqlx::query_as("SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        product.ok_or(ShopError::NotFound("product"))
    }

    async fn variants_of(&self, product_id: Uuid) -> ShopResult<Vec<ProductItemDetail>> {
        let variants: Vec<ProductItemDetail> = sqlx::query_as(
            "SELECT i.id, i.size_id, s.name AS size_name, i.color_id, c.name AS color_name, \
                    i.quantity, i.type \
             FROM product_items i \
             JOIN sizes s ON s.id = i.size_id \
             JOIN colors c ON c.id = i.color_id \
             WHERE i.product_id = $1 \
             ORDER BY i.id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(variants)
    }

    /// Partial update. Image fields not supplied keep their stored value;
    /// newly supplied description images append to the stored list.
    pub async fn update(&self, id: Uuid, input: UpdateProduct) -> ShopResult<Product> {
        input.validate()?;
        let current = self.get_basic(id).await?;

        let price = input.price.unwrap_or(current.price);
        let price_sale = input.price_sale.unwrap_or(current.price_sale);
        check_sale_price(price, price_sale)?;

        let category_id = input.category_id.unwrap_or(current.category_id);
        if input.category_id.is_some() && !self.category_exists(category_id).await? {
            return Err(ShopError::validation("category does not exist"));
        }

        let image_product = input.image_product.or(current.image_product);
        let image_description = match input.image_description {
            Some(new) => {
                let mut merged = current.image_description;
                merged.extend(new);
                merged
            }
            None => current.image_description,
        };

        let updated: Option<Product> = sqlx::query_as(
            "UPDATE products SET category_id = $2, title = $3, name = $4, status = $5, \
                    description = $6, price = $7, price_sale = $8, image_product = $9, \
                    image_description = $10, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(id)
        .bind(category_id)
        .bind(input.title.unwrap_or(current.title))
        .bind(input.name.unwrap_or(current.name))
        .bind(input.status.unwrap_or(current.status))
        .bind(input.description.or(current.description))
        .bind(price)
        .bind(price_sale)
        .bind(image_product)
        .bind(image_description)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(ShopError::NotFound("product"))
    }

    /// Hides the product from live queries; reversible via [`Self::restore`].
    pub async fn soft_delete(&self, id: Uuid) -> ShopResult<Product> {
        let deleted: Option<Product> = sqlx::query_as(
            "UPDATE products SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        deleted.ok_or(ShopError::NotFound("product"))
    }

    /// Brings a soft-deleted product back into live queries. Resolves the
    /// id among trashed rows too.
    pub async fn restore(&self, id: Uuid) -> ShopResult<()> {
        let restored = sqlx::query(
            "UPDATE products SET deleted_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if restored.rows_affected() == 0 {
            return Err(ShopError::NotFound("product"));
        }
        Ok(())
    }

    /// Physically removes the product and, by cascade, its SKUs.
    pub async fn purge(&self, id: Uuid) -> ShopResult<()> {
        let purged = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if purged.rows_affected() == 0 {
            return Err(ShopError::NotFound("product"));
        }
        Ok(())
    }

    pub async fn list_deleted(&self) -> ShopResult<Vec<Product>> {
        let products: Vec<Product> = sqlx::query_as(
            "SELECT * FROM products WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Live products in a category; an empty category is reported as
    /// not-found.
    pub async fn by_category(&self, category_id: Uuid) -> ShopResult<Vec<Product>> {
        let products: Vec<Product> = sqlx::query_as(
            "SELECT * FROM products WHERE category_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        if products.is_empty() {
            return Err(ShopError::NotFound("products in this category"));
        }
        Ok(products)
    }

    pub async fn count(&self) -> ShopResult<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    pub async fn categories(&self, page: i64) -> ShopResult<Page<Category>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        let data: Vec<Category> =
            sqlx::query_as("SELECT * FROM categories ORDER BY name LIMIT $1 OFFSET $2")
                .bind(CATEGORY_PER_PAGE)
                .bind((page - 1) * CATEGORY_PER_PAGE)
                .fetch_all(&self.pool)
                .await?;
        Ok(Page::new(data, total, page, CATEGORY_PER_PAGE))
    }

    pub async fn category_exists(&self, id: Uuid) -> ShopResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_price_must_not_exceed_price() {
        assert!(check_sale_price(2_000_000, 2_500_000).is_err());
        assert!(check_sale_price(2_000_000, 2_000_000).is_ok());
        assert!(check_sale_price(2_000_000, 0).is_ok());
    }

    #[test]
    fn bracket_bounds() {
        assert_eq!(PriceRange::OneToTwo.bounds(), (1_000_000, 2_000_000));
        assert_eq!(PriceRange::TwoToFive.bounds(), (2_000_000, 5_000_000));
        assert_eq!(PriceRange::FiveToTen.bounds(), (5_000_000, 10_000_000));
    }

    #[test]
    fn bracket_parses_from_query_token() {
        let parsed: PriceRange = serde_json::from_str("\"2m-5m\"").unwrap();
        assert_eq!(parsed, PriceRange::TwoToFive);
        assert!(serde_json::from_str::<PriceRange>("\"10m-20m\"").is_err());
    }

    #[test]
    fn create_payload_validation() {
        let input = CreateProduct {
            category_id: Uuid::new_v4(),
            title: "Linen shirt".into(),
            name: "Linen shirt, relaxed fit".into(),
            status: ProductStatus::Active,
            description: None,
            price: 1_500_000,
            price_sale: Some(1_200_000),
            image_product: None,
            image_description: None,
            variants: "[]".into(),
        };
        assert!(input.validate().is_ok());

        let long_title = CreateProduct {
            title: "x".repeat(256),
            ..input
        };
        assert!(long_title.validate().is_err());
    }
}
