//! Stripe webhook event parsing.
//!
//! Only Checkout Session events matter to the storefront; everything else is
//! surfaced as [`WebhookEvent::Unknown`] so the caller can log and ignore it.

use serde::Deserialize;

use crate::Result;

/// A parsed webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct StripeEvent {
  /// `evt_...`; identical across redeliveries of the same event.
  pub id:         String,
  pub event_type: String,
  pub event:      WebhookEvent,
}

/// The storefront-relevant meaning of a webhook event.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
  /// `checkout.session.completed` or `checkout.session.async_payment_succeeded`.
  CheckoutCompleted(CheckoutSessionData),
  /// `checkout.session.async_payment_failed`.
  CheckoutFailed(CheckoutSessionData),
  /// `checkout.session.expired`.
  CheckoutExpired(CheckoutSessionData),
  Unknown,
}

/// The fields of a Checkout Session object the storefront reads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckoutSessionData {
  pub session_id:     String,
  pub customer_email: Option<String>,
  /// Minor currency units.
  pub amount_total:   i64,
  pub currency:       String,
  /// From `metadata.product_id`, set when this server opened the session.
  pub product_id:     Option<String>,
  pub product_name:   Option<String>,
  pub user_id:        Option<String>,
  /// `paid`, `unpaid` or `no_payment_required`.
  pub payment_status: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
  id:     String,
  #[serde(rename = "type")]
  kind:   String,
  #[serde(default)]
  data:   EnvelopeData,
}

#[derive(Deserialize, Default)]
struct EnvelopeData {
  #[serde(default)]
  object: serde_json::Value,
}

#[derive(Deserialize)]
struct SessionObject {
  id:               String,
  customer_email:   Option<String>,
  customer_details: Option<CustomerDetails>,
  amount_total:     Option<i64>,
  currency:         Option<String>,
  payment_status:   Option<String>,
  #[serde(default)]
  metadata:         SessionMetadata,
}

#[derive(Deserialize)]
struct CustomerDetails {
  email: Option<String>,
}

#[derive(Deserialize, Default)]
struct SessionMetadata {
  product_id:   Option<String>,
  product_name: Option<String>,
  user_id:      Option<String>,
}

impl From<SessionObject> for CheckoutSessionData {
  fn from(s: SessionObject) -> Self {
    let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
    Self {
      session_id:     s.id,
      customer_email: non_empty(s.customer_email)
        .or_else(|| non_empty(s.customer_details.and_then(|d| d.email))),
      amount_total:   s.amount_total.unwrap_or(0),
      currency:       s.currency.unwrap_or_else(|| "usd".to_owned()).to_lowercase(),
      product_id:     non_empty(s.metadata.product_id),
      product_name:   non_empty(s.metadata.product_name),
      user_id:        non_empty(s.metadata.user_id),
      payment_status: s.payment_status,
    }
  }
}

/// Parse a (signature-verified) webhook body.
pub fn parse_event(payload: &[u8]) -> Result<StripeEvent> {
  let envelope: Envelope = serde_json::from_slice(payload)?;

  let session = || -> Result<CheckoutSessionData> {
    let object: SessionObject = serde_json::from_value(envelope.data.object.clone())?;
    Ok(object.into())
  };

  let event = match envelope.kind.as_str() {
    "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
      WebhookEvent::CheckoutCompleted(session()?)
    }
    "checkout.session.async_payment_failed" => WebhookEvent::CheckoutFailed(session()?),
    "checkout.session.expired" => WebhookEvent::CheckoutExpired(session()?),
    _ => WebhookEvent::Unknown,
  };

  Ok(StripeEvent { id: envelope.id, event_type: envelope.kind, event })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_completed_session() {
    let payload = br#"{
      "id": "evt_123",
      "type": "checkout.session.completed",
      "data": {
        "object": {
          "id": "cs_test_abc",
          "customer_email": null,
          "customer_details": { "email": "buyer@example.com" },
          "amount_total": 2500,
          "currency": "USD",
          "payment_status": "paid",
          "metadata": {
            "product_id": "ai-tools-mastery-guide-2025",
            "product_name": "AI Tools Mastery Guide 2025",
            "user_id": ""
          }
        }
      }
    }"#;

    let parsed = parse_event(payload).unwrap();
    assert_eq!(parsed.id, "evt_123");
    let WebhookEvent::CheckoutCompleted(session) = parsed.event else {
      panic!("expected CheckoutCompleted, got {:?}", parsed.event);
    };
    assert_eq!(session.session_id, "cs_test_abc");
    assert_eq!(session.customer_email.as_deref(), Some("buyer@example.com"));
    assert_eq!(session.amount_total, 2500);
    assert_eq!(session.currency, "usd");
    assert_eq!(session.product_id.as_deref(), Some("ai-tools-mastery-guide-2025"));
    assert_eq!(session.user_id, None);
  }

  #[test]
  fn async_outcomes_map_to_their_variants() {
    let body = |kind: &str| {
      format!(r#"{{"id":"evt_1","type":"{kind}","data":{{"object":{{"id":"cs_1"}}}}}}"#)
    };

    let ok = parse_event(body("checkout.session.async_payment_succeeded").as_bytes()).unwrap();
    assert!(matches!(ok.event, WebhookEvent::CheckoutCompleted(_)));

    let failed = parse_event(body("checkout.session.async_payment_failed").as_bytes()).unwrap();
    assert!(matches!(failed.event, WebhookEvent::CheckoutFailed(ref s) if s.session_id == "cs_1"));

    let expired = parse_event(body("checkout.session.expired").as_bytes()).unwrap();
    assert!(matches!(expired.event, WebhookEvent::CheckoutExpired(_)));
  }

  #[test]
  fn unrelated_events_are_unknown() {
    let payload = br#"{"id": "evt_9", "type": "invoice.paid", "data": {"object": {}}}"#;
    let parsed = parse_event(payload).unwrap();
    assert_eq!(parsed.event_type, "invoice.paid");
    assert_eq!(parsed.event, WebhookEvent::Unknown);
  }

  #[test]
  fn garbage_is_rejected() {
    assert!(parse_event(b"not json").is_err());
    // A session event without a session id is malformed.
    let payload = br#"{"id": "evt_1", "type": "checkout.session.completed", "data": {"object": {}}}"#;
    assert!(parse_event(payload).is_err());
  }
}
