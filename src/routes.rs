//! HTTP surface over the core services.

use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::catalog::{CatalogStore, CreateProduct, PriceRange, UpdateProduct};
use crate::domain::sales::ProductSales;
use crate::error::{ShopError, ShopResult};
use crate::models::{Category, Comment, Page, Product, ProductWithVariants};
use crate::reviews::{ReviewGate, SubmitReview};
use crate::stats::SalesStats;
use crate::storage::{FileUpload, LocalBlobStore};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogStore,
    pub reviews: ReviewGate<LocalBlobStore>,
    pub stats: SalesStats,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/all", get(list_all_products))
        .route("/api/v1/products/count", get(count_products))
        .route("/api/v1/products/deleted", get(list_deleted_products))
        .route(
            "/api/v1/products/:id",
            get(get_product).put(update_product).delete(soft_delete_product),
        )
        .route("/api/v1/products/:id/restore", post(restore_product))
        .route("/api/v1/products/:id/purge", delete(purge_product))
        .route("/api/v1/products/:id/search", post(record_search))
        .route("/api/v1/products/:id/reviews", get(list_product_reviews))
        .route("/api/v1/shop/products", get(shop_products))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/categories/:id/products", get(products_by_category))
        .route("/api/v1/reviews", post(submit_review))
        .route("/api/v1/reviews/mine", get(my_reviews))
        .route("/api/v1/reviews/:id", delete(delete_review))
        .route("/api/v1/stats/top-selling/:year/:month", get(top_selling))
        .route("/api/v1/stats/top-searched/:year/:month", get(top_searched))
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "atelier-commerce" }))
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ShopParams {
    page: Option<i64>,
    category_id: Option<Uuid>,
    price_range: Option<PriceRange>,
}

fn page_or_first(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<PageParams>,
) -> ShopResult<Json<Page<Product>>> {
    Ok(Json(s.catalog.list(page_or_first(p.page)).await?))
}

async fn list_all_products(State(s): State<AppState>) -> ShopResult<Json<Vec<Product>>> {
    Ok(Json(s.catalog.list_all().await?))
}

async fn shop_products(
    State(s): State<AppState>,
    Query(p): Query<ShopParams>,
) -> ShopResult<Json<Page<Product>>> {
    let page = page_or_first(p.page);
    Ok(Json(s.catalog.shop_list(page, p.category_id, p.price_range).await?))
}

async fn create_product(
    State(s): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> ShopResult<(StatusCode, Json<ProductWithVariants>)> {
    let created = s.catalog.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<ProductWithVariants>> {
    Ok(Json(s.catalog.get(id).await?))
}

async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProduct>,
) -> ShopResult<Json<Product>> {
    Ok(Json(s.catalog.update(id, input).await?))
}

async fn soft_delete_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<Product>> {
    Ok(Json(s.catalog.soft_delete(id).await?))
}

async fn restore_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<serde_json::Value>> {
    s.catalog.restore(id).await?;
    Ok(Json(serde_json::json!({ "message": "product restored" })))
}

async fn purge_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ShopResult<StatusCode> {
    s.catalog.purge(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_deleted_products(State(s): State<AppState>) -> ShopResult<Json<Vec<Product>>> {
    Ok(Json(s.catalog.list_deleted().await?))
}

async fn count_products(State(s): State<AppState>) -> ShopResult<Json<serde_json::Value>> {
    let total = s.catalog.count().await?;
    Ok(Json(serde_json::json!({ "total": total })))
}

async fn list_categories(
    State(s): State<AppState>,
    Query(p): Query<PageParams>,
) -> ShopResult<Json<Page<Category>>> {
    Ok(Json(s.catalog.categories(page_or_first(p.page)).await?))
}

async fn products_by_category(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<Vec<Product>>> {
    Ok(Json(s.catalog.by_category(id).await?))
}

/// Reviews arrive as multipart form data so an image can ride along.
async fn submit_review(
    State(s): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ShopResult<(StatusCode, Json<Comment>)> {
    let mut product_item_id = None;
    let mut content = None;
    let mut rating = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ShopError::validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "product_item_id" => {
                product_item_id = Some(
                    field_text(field)
                        .await?
                        .parse::<Uuid>()
                        .map_err(|_| ShopError::validation("invalid product_item_id"))?,
                );
            }
            "content" => content = Some(field_text(field).await?),
            "rating" => {
                rating = Some(
                    field_text(field)
                        .await?
                        .parse::<i32>()
                        .map_err(|_| ShopError::validation("invalid rating"))?,
                );
            }
            "image" => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ShopError::validation(e.to_string()))?
                    .to_vec();
                image = Some(FileUpload { filename, content_type, bytes });
            }
            _ => {}
        }
    }

    let input = SubmitReview {
        product_item_id: product_item_id
            .ok_or_else(|| ShopError::validation("product_item_id is required"))?,
        content: content.ok_or_else(|| ShopError::validation("content is required"))?,
        rating: rating.ok_or_else(|| ShopError::validation("rating is required"))?,
    };
    let review = s.reviews.submit(user.0, input, image).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn field_text(field: Field<'_>) -> ShopResult<String> {
    field
        .text()
        .await
        .map_err(|e| ShopError::validation(e.to_string()))
}

async fn delete_review(
    State(s): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<serde_json::Value>> {
    s.reviews.delete(user.0, id).await?;
    Ok(Json(serde_json::json!({ "message": "comment deleted successfully" })))
}

async fn list_product_reviews(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<Vec<Comment>>> {
    Ok(Json(s.reviews.list_for_product(id).await?))
}

async fn my_reviews(State(s): State<AppState>, user: AuthUser) -> ShopResult<Json<Vec<Comment>>> {
    Ok(Json(s.reviews.list_for_user(user.0).await?))
}

async fn top_selling(
    State(s): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ShopResult<Json<Vec<ProductSales>>> {
    Ok(Json(s.stats.top_selling_by_month(year, month).await?))
}

async fn record_search(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ShopResult<Json<Product>> {
    Ok(Json(s.stats.record_search(id).await?))
}

async fn top_searched(
    State(s): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ShopResult<Json<Vec<Product>>> {
    Ok(Json(s.stats.top_searched(year, month).await?))
}
