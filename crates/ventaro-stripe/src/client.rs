//! REST client for the Checkout Sessions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{CheckoutRequest, CheckoutSession, PaymentGateway, Result, StripeConfig, StripeError};

/// Stripe REST client.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct StripeClient {
  client: Client,
  config: StripeConfig,
}

#[derive(Deserialize)]
struct SessionResponse {
  id:  String,
  url: Option<String>,
}

impl StripeClient {
  pub fn new(config: StripeConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn is_configured(&self) -> bool { !self.config.secret_key.is_empty() }

  fn url(&self, path: &str) -> String {
    format!("{}/v1{}", self.config.api_base.trim_end_matches('/'), path)
  }
}

/// Form fields for `POST /v1/checkout/sessions`, in Stripe's bracketed
/// notation.
pub(crate) fn checkout_form(req: &CheckoutRequest) -> Vec<(String, String)> {
  let mut form: Vec<(String, String)> = vec![
    ("mode".into(), "payment".into()),
    ("customer_email".into(), req.customer_email.clone()),
    ("success_url".into(), req.success_url.clone()),
    ("cancel_url".into(), req.cancel_url.clone()),
    ("line_items[0][quantity]".into(), "1".into()),
  ];

  match &req.stripe_price_id {
    Some(price) => form.push(("line_items[0][price]".into(), price.clone())),
    None => {
      let data = "line_items[0][price_data]";
      form.push((format!("{data}[currency]"), req.currency.to_lowercase()));
      form.push((format!("{data}[unit_amount]"), req.amount.to_string()));
      form.push((format!("{data}[product_data][name]"), req.product_name.clone()));
    }
  }

  form.push(("metadata[product_id]".into(), req.product_id.clone()));
  form.push(("metadata[product_name]".into(), req.product_name.clone()));
  if let Some(user_id) = &req.user_id {
    form.push(("metadata[user_id]".into(), user_id.clone()));
  }
  form
}

#[async_trait]
impl PaymentGateway for StripeClient {
  async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
    if !self.is_configured() {
      return Err(StripeError::NotConfigured);
    }

    let resp = self
      .client
      .post(self.url("/checkout/sessions"))
      .bearer_auth(&self.config.secret_key)
      .form(&checkout_form(&request))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body: serde_json::Value = resp.json().await.unwrap_or_default();
      let message = body["error"]["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_owned();
      tracing::warn!(status = status.as_u16(), %message, "stripe rejected checkout session");
      return Err(StripeError::Api { status: status.as_u16(), message });
    }

    let session: SessionResponse = resp.json().await?;
    tracing::info!(
      session_id = %session.id,
      product_id = %request.product_id,
      "checkout session created"
    );

    Ok(CheckoutSession {
      session_id:   session.id,
      checkout_url: session.url.unwrap_or_default(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request() -> CheckoutRequest {
    CheckoutRequest {
      product_id:      "ai-prompts-arsenal-2025".into(),
      product_name:    "AI Prompts Arsenal 2025".into(),
      amount:          1000,
      currency:        "USD".into(),
      stripe_price_id: None,
      customer_email:  "buyer@example.com".into(),
      user_id:         Some("8d3c2a4e-0000-4000-8000-000000000001".into()),
      success_url:     "https://ventaro.ai/success?session_id={CHECKOUT_SESSION_ID}".into(),
      cancel_url:      "https://ventaro.ai/products".into(),
    }
  }

  fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
    form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }

  #[test]
  fn inline_price_data_without_price_id() {
    let form = checkout_form(&request());
    assert_eq!(field(&form, "mode"), Some("payment"));
    assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("1000"));
    assert_eq!(field(&form, "line_items[0][price_data][currency]"), Some("usd"));
    assert_eq!(field(&form, "line_items[0][price]"), None);
    assert_eq!(field(&form, "metadata[product_id]"), Some("ai-prompts-arsenal-2025"));
    assert!(field(&form, "success_url").is_some_and(|u| u.contains("{CHECKOUT_SESSION_ID}")));
  }

  #[test]
  fn configured_price_id_wins() {
    let req = CheckoutRequest { stripe_price_id: Some("price_123".into()), user_id: None, ..request() };
    let form = checkout_form(&req);
    assert_eq!(field(&form, "line_items[0][price]"), Some("price_123"));
    assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), None);
    assert_eq!(field(&form, "metadata[user_id]"), None);
  }

  #[tokio::test]
  async fn unconfigured_client_refuses() {
    let client = StripeClient::new(StripeConfig::default()).unwrap();
    let err = client.create_checkout_session(request()).await.unwrap_err();
    assert!(matches!(err, StripeError::NotConfigured));
  }
}
