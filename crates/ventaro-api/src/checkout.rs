//! `POST /checkout`: open a Stripe Checkout Session for one product.
//!
//! The purchase is recorded `pending` as soon as Stripe returns a session id;
//! the webhook completes it later.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::json;
use ventaro_core::{audit::NewSystemLog, purchase::NewPurchase, store::Storefront};
use ventaro_stripe::CheckoutRequest;

use crate::{
  AppState,
  auth::AuthUser,
  error::ApiError,
  extract::ApiJson,
  notify,
  products::active_product,
};

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
  pub product_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
  pub session_id: String,
  pub url:        String,
}

/// `POST /checkout`
pub async fn create<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AuthUser(profile): AuthUser,
  ApiJson(body): ApiJson<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, ApiError> {
  let product = active_product(&*state.store, &body.product_id).await?;
  let site = state.config.site_url.trim_end_matches('/');

  let request = CheckoutRequest {
    product_id:      product.id.clone(),
    product_name:    product.name.clone(),
    amount:          product.price,
    currency:        product.currency.clone(),
    stripe_price_id: product.stripe_price_id.clone(),
    customer_email:  profile.email.clone(),
    user_id:         Some(profile.id.to_string()),
    success_url:     format!("{site}/purchase/success?session_id={{CHECKOUT_SESSION_ID}}"),
    cancel_url:      format!("{site}/products/{}", product.id),
  };

  let session = match state.gateway.create_checkout_session(request).await {
    Ok(session) => session,
    Err(e) => {
      tracing::error!(product_id = %product.id, error = %e, "checkout session failed");
      notify::system_log(
        &state,
        NewSystemLog::error(
          "checkout",
          "failed to create checkout session",
          json!({ "product_id": product.id, "user_id": profile.id, "error": e.to_string() }),
        ),
      )
      .await;
      return Err(ApiError::Upstream("payment provider unavailable".into()));
    }
  };

  state
    .store
    .create_purchase(NewPurchase {
      user_id:           Some(profile.id),
      customer_email:    profile.email.clone(),
      product_id:        product.id.clone(),
      product_name:      Some(product.name.clone()),
      stripe_session_id: session.session_id.clone(),
      amount:            product.price,
      currency:          product.currency.clone(),
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    session_id = %session.session_id,
    product_id = %product.id,
    user_id = %profile.id,
    "pending purchase recorded"
  );

  Ok(Json(CheckoutResponse { session_id: session.session_id, url: session.checkout_url }))
}
