//! Read-only catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::{CollectionId, ProductId};
use serde::{Deserialize, Serialize};
use store::{Collection, Product, ProductImage, Stock, Store};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub collection: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Collection> for CollectionResponse {
    fn from(c: Collection) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub product_id: ProductId,
    pub url: String,
    pub display_order: i32,
}

/// Prices are decimal major units; stock counters are flattened as `stock_<size>`.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub collection_id: CollectionId,
    pub collection: CollectionResponse,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub base_price: f64,
    pub status: &'static str,
    #[serde(flatten)]
    pub stock: Stock,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ImageResponse>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        let images = p
            .images
            .into_iter()
            .map(|ProductImage { url, display_order }| ImageResponse {
                product_id: p.id,
                url,
                display_order,
            })
            .collect();
        Self {
            id: p.id,
            collection_id: p.collection.id,
            collection: p.collection.into(),
            name: p.name,
            slug: p.slug,
            product_type: p.product_type,
            description: p.description,
            base_price: p.base_price.to_major(),
            status: p.status.as_str(),
            stock: p.stock,
            created_at: p.created_at,
            images,
        }
    }
}

// -- Handlers --

/// GET /api/collections: active collections.
#[tracing::instrument(skip(state))]
pub async fn list_collections<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CollectionResponse>>, ApiError> {
    let collections = state
        .store()
        .list_collections()
        .await
        .map_err(ApiError::store("Failed to fetch collections"))?;

    Ok(Json(collections.into_iter().map(Into::into).collect()))
}

/// GET /api/products?collection=<slug>: products, optionally of one collection.
#[tracing::instrument(skip(state))]
pub async fn list_products<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let collection = query.collection.as_deref().filter(|slug| !slug.is_empty());
    let products = state
        .store()
        .list_products(collection)
        .await
        .map_err(ApiError::store("Failed to fetch products"))?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /api/products/{slug}: a single product.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .store()
        .product_by_slug(&slug)
        .await
        .map_err(ApiError::store("Failed to fetch product"))?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product.into()))
}
