//! `GET /debug/purchase-flow?email=`: trace one buyer through the purchase
//! pipeline. Admin only.
//!
//! Shows the profile (if any), every purchase matched by profile id or email,
//! and for each purchase the code the Stripe product name maps to today.

use axum::{
  Json,
  extract::State,
};
use serde::{Deserialize, Serialize};
use ventaro_core::{
  catalog::map_stripe_product_to_internal,
  normalize_email,
  profile::Profile,
  purchase::{Owner, Purchase, PurchaseFilter},
  store::Storefront,
};

use crate::{AppState, auth::AdminUser, error::ApiError, extract::ApiQuery};

#[derive(Debug, Deserialize)]
pub struct FlowQuery {
  pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TracedPurchase {
  #[serde(flatten)]
  pub purchase:      Purchase,
  /// What the recorded product name maps to now.
  pub mapped_code:   Option<&'static str>,
  /// The stored code disagrees with `mapped_code`; reconciliation would fix it.
  pub mismatch:      bool,
  /// The code names a product in the catalog.
  pub known_product: bool,
}

#[derive(Debug, Serialize)]
pub struct PurchaseFlow {
  pub email:     String,
  pub profile:   Option<Profile>,
  pub purchases: Vec<TracedPurchase>,
}

/// `GET /debug/purchase-flow`
pub async fn purchase_flow<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ApiQuery(query): ApiQuery<FlowQuery>,
) -> Result<Json<PurchaseFlow>, ApiError> {
  let email = normalize_email(&query.email);
  if email.is_empty() {
    return Err(ApiError::BadRequest("email is required".into()));
  }

  let profile = state
    .store
    .get_profile_by_email(&email)
    .await
    .map_err(ApiError::store)?;

  // Without a profile, match on email alone; the nil id never matches a row.
  let owner = Owner {
    user_id: profile.as_ref().map_or(uuid::Uuid::nil(), |p| p.id),
    email:   Some(email.clone()),
  };
  let purchases = state
    .store
    .list_purchases(&PurchaseFilter { owner: Some(owner), status: None })
    .await
    .map_err(ApiError::store)?;

  let mut traced = Vec::with_capacity(purchases.len());
  for purchase in purchases {
    let mapped_code = purchase
      .product_name
      .as_deref()
      .and_then(map_stripe_product_to_internal);
    let mismatch = mapped_code.is_some_and(|code| code != purchase.product_id);
    let known_product = state
      .store
      .get_product(&purchase.product_id)
      .await
      .map_err(ApiError::store)?
      .is_some();
    traced.push(TracedPurchase { purchase, mapped_code, mismatch, known_product });
  }

  tracing::debug!(email = %email, purchases = traced.len(), "purchase flow traced");
  Ok(Json(PurchaseFlow { email, profile, purchases: traced }))
}
