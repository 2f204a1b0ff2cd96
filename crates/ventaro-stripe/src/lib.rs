//! Stripe Checkout integration for the Ventaro storefront.
//!
//! Three concerns live here:
//! - creating hosted Checkout Sessions through the REST API ([`StripeClient`]),
//! - verifying the `Stripe-Signature` header on webhook deliveries
//!   ([`verify_signature`]),
//! - turning a verified payload into a [`WebhookEvent`] ([`parse_event`]).
//!
//! The API layer depends on the [`PaymentGateway`] trait so tests can swap in
//! a fake gateway.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

mod client;
mod signature;
mod webhook;

pub use client::StripeClient;
pub use signature::{sign, verify_signature, DEFAULT_TOLERANCE_SECS};
pub use webhook::{parse_event, CheckoutSessionData, StripeEvent, WebhookEvent};

/// Stripe integration errors.
#[derive(Debug, Error)]
pub enum StripeError {
  #[error("stripe secret key is not configured")]
  NotConfigured,

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("stripe returned {status}: {message}")]
  Api { status: u16, message: String },

  #[error("invalid webhook signature: {0}")]
  InvalidSignature(&'static str),

  #[error("invalid webhook payload: {0}")]
  InvalidPayload(#[from] serde_json::Error),
}

pub type Result<T, E = StripeError> = std::result::Result<T, E>;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Stripe credentials and endpoints. Empty strings mean "not configured".
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
  /// Secret API key (`sk_live_...` / `sk_test_...`).
  #[serde(default)]
  pub secret_key:     String,
  /// Endpoint signing secret (`whsec_...`).
  #[serde(default)]
  pub webhook_secret: String,
  #[serde(default = "default_api_base")]
  pub api_base:       String,
  /// Maximum age of a webhook signature timestamp.
  #[serde(default = "default_tolerance")]
  pub tolerance_secs: i64,
}

fn default_api_base() -> String { "https://api.stripe.com".to_owned() }

fn default_tolerance() -> i64 { DEFAULT_TOLERANCE_SECS }

impl Default for StripeConfig {
  fn default() -> Self {
    Self {
      secret_key:     String::new(),
      webhook_secret: String::new(),
      api_base:       default_api_base(),
      tolerance_secs: DEFAULT_TOLERANCE_SECS,
    }
  }
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Everything needed to open a one-off payment Checkout Session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
  /// Internal product code, echoed back in the session metadata.
  pub product_id:      String,
  pub product_name:    String,
  /// Unit amount in minor currency units; used when no price id is set.
  pub amount:          i64,
  pub currency:        String,
  /// A Stripe Price to charge instead of inline price data.
  pub stripe_price_id: Option<String>,
  pub customer_email:  String,
  /// Buyer profile id, echoed back in the session metadata.
  pub user_id:         Option<String>,
  /// May contain the `{CHECKOUT_SESSION_ID}` placeholder.
  pub success_url:     String,
  pub cancel_url:      String,
}

/// A freshly created Checkout Session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
  pub session_id:   String,
  /// Hosted payment page to redirect the buyer to.
  pub checkout_url: String,
}

/// Payment provider abstraction used by the checkout route.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
}
