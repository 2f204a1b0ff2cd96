//! JSON REST API for the Ventaro storefront.
//!
//! Exposes an axum [`Router`] backed by any [`Storefront`], a
//! [`PaymentGateway`] and a [`Mailer`]. TLS and listening are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = ventaro_api::app(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod bookings;
pub mod checkout;
pub mod debug;
pub mod error;
pub mod extract;
pub mod products;
pub mod purchases;
pub mod rate_limit;
pub mod webhook;

mod notify;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;
use ventaro_core::store::Storefront;
use ventaro_mail::Mailer;
use ventaro_stripe::PaymentGateway;

pub use error::ApiError;
pub use rate_limit::RateLimiter;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime settings the handlers read.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Public storefront URL; used for checkout redirects and email links.
  pub site_url:               String,
  /// Receives new-purchase and new-booking notifications.
  pub admin_email:            String,
  /// Stripe endpoint signing secret. Empty skips verification.
  pub webhook_secret:         String,
  pub webhook_tolerance_secs: i64,
  /// Directory holding the files named by `Product::download_file`.
  pub downloads_dir:          PathBuf,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub mailer:  Arc<dyn Mailer>,
  pub limiter: Arc<RateLimiter>,
  pub config:  Arc<ApiConfig>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      gateway: Arc::clone(&self.gateway),
      mailer:  Arc::clone(&self.mailer),
      limiter: Arc::clone(&self.limiter),
      config:  Arc::clone(&self.config),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router. Paths are relative; mount it under `/api`.
pub fn api_router<S: Storefront + 'static>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Account
    .route("/auth/signup", post(account::signup::<S>))
    .route("/auth/login", post(account::login::<S>))
    .route("/auth/me", get(account::me))
    // Storefront
    .route("/products", get(products::list::<S>))
    .route("/products/{id}", get(products::get_one::<S>))
    .route("/checkout", post(checkout::create::<S>))
    .route("/webhooks/stripe", post(webhook::stripe::<S>))
    // Buyer
    .route("/purchases", get(purchases::list_mine::<S>))
    .route("/entitlements/{product_id}", get(purchases::entitlement::<S>))
    .route("/downloads/{product_id}", get(purchases::download::<S>))
    .route("/consultation-booking", post(bookings::create::<S>))
    .route("/bookings", get(bookings::list_mine::<S>))
    // Admin
    .route("/admin/dashboard", get(admin::dashboard::<S>))
    .route(
      "/admin/products",
      get(admin::list_products::<S>).post(admin::create_product::<S>),
    )
    .route("/admin/products/{id}", patch(admin::update_product::<S>))
    .route("/admin/purchases", get(admin::list_purchases::<S>))
    .route("/admin/purchases/reconcile", post(admin::reconcile::<S>))
    .route("/admin/bookings", get(admin::list_bookings::<S>))
    .route("/admin/bookings/{id}", patch(admin::update_booking::<S>))
    .route("/admin/logs/email", get(admin::email_logs::<S>))
    .route("/admin/logs/system", get(admin::system_logs::<S>))
    // Debug
    .route("/debug/purchase-flow", get(debug::purchase_flow::<S>))
    .with_state(state)
}

/// The full application: the API under `/api` with request tracing.
pub fn app<S: Storefront + 'static>(state: AppState<S>) -> Router<()> {
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}
