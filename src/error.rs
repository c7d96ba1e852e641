//! Service error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::domain::variants::VariantError;

/// Unique index guarding one review per (user, SKU).
pub const UQ_REVIEW_PER_USER_ITEM: &str = "comments_user_product_item_key";
/// Unique index guarding one SKU per (product, size, color).
pub const UQ_ITEM_PER_PRODUCT_SIZE_COLOR: &str = "product_items_product_size_color_key";

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ShopError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ShopError {
    fn from(err: sqlx::Error) -> Self {
        // Constraint violations on the review and SKU uniqueness rules are
        // domain outcomes, not storage failures.
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                match db.constraint() {
                    Some(UQ_REVIEW_PER_USER_ITEM) => {
                        return Self::forbidden("you have already reviewed this product");
                    }
                    Some(UQ_ITEM_PER_PRODUCT_SIZE_COLOR) => {
                        return Self::validation("duplicate size/color pair in variants");
                    }
                    _ => {}
                }
            }
            if db.is_foreign_key_violation() {
                match db.constraint() {
                    Some("product_items_size_id_fkey") | Some("product_items_color_id_fkey") => {
                        return Self::validation("size or color does not exist");
                    }
                    Some("products_category_id_fkey") => {
                        return Self::validation("category does not exist");
                    }
                    _ => {}
                }
            }
            if db.is_check_violation() && db.constraint() == Some("products_price_sale_le_price") {
                return Self::validation("price_sale cannot be greater than price");
            }
        }
        Self::Database(err)
    }
}

impl From<VariantError> for ShopError {
    fn from(err: VariantError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errs: validator::ValidationErrors) -> Self {
        Self::Validation(errs.to_string())
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

pub type ShopResult<T> = Result<T, ShopError>;
