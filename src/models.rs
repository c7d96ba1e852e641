//! Storage row types shared across the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipping,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub name: String,
    pub status: ProductStatus,
    pub description: Option<String>,
    pub price: i64,
    pub price_sale: i64,
    pub image_product: Option<String>,
    pub image_description: Vec<String>,
    pub search_count: i64,
    pub search_count_date: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SKU joined with its size and color names, as served on the detail view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductItemDetail {
    pub id: Uuid,
    pub size_id: Uuid,
    pub size_name: String,
    pub color_id: Uuid,
    pub color_name: String,
    pub quantity: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductItemDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub product_item_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub rating: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Laravel-style pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub last_page: i64,
    pub total: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, current_page: i64, per_page: i64) -> Self {
        let last_page = ((total + per_page - 1) / per_page).max(1);
        Self {
            data,
            current_page,
            last_page,
            total,
            per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math() {
        let page = Page::new(vec![1, 2, 3], 31, 1, 10);
        assert_eq!(page.last_page, 4);
        let exact = Page::new(vec![1], 30, 3, 10);
        assert_eq!(exact.last_page, 3);
    }

    #[test]
    fn empty_listing_still_has_one_page() {
        let page: Page<i32> = Page::new(vec![], 0, 1, 10);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.total, 0);
    }
}
