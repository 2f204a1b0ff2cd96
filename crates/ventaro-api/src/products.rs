//! Handlers for the public `/products` catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | Active products, cheapest first |
//! | `GET`  | `/products/:id` | 404 if missing or inactive |

use axum::{
  Json,
  extract::State,
};
use ventaro_core::{product::Product, store::Storefront};

use crate::{AppState, error::ApiError, extract::ApiPath};

/// `GET /products`
pub async fn list<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Product>>, ApiError> {
  let products = state
    .store
    .list_products(true)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(products))
}

/// `GET /products/:id`
pub async fn get_one<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<String>,
) -> Result<Json<Product>, ApiError> {
  active_product(&*state.store, &id).await.map(Json)
}

/// The product `id`, provided it exists and is on sale.
pub(crate) async fn active_product<S: Storefront>(store: &S, id: &str) -> Result<Product, ApiError> {
  store
    .get_product(id)
    .await
    .map_err(ApiError::store)?
    .filter(|p| p.is_active)
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}
