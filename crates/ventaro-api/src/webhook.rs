//! `POST /webhooks/stripe`: apply Stripe Checkout events to purchases.
//!
//! Every delivery that passes signature verification is acknowledged with 200
//! and leaves one row in the system log. A completed session ends with exactly
//! one `completed` purchase for its session id; emails go out only on the
//! delivery that completed it. A session completed with `payment_status`
//! `unpaid` is held as `pending` until the async payment events settle it.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::HeaderMap,
};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;
use ventaro_core::{
  audit::NewSystemLog,
  catalog::map_stripe_product_to_internal,
  purchase::{CompletedSession, NewPurchase, Purchase, PurchaseStatus},
  store::Storefront,
};
use ventaro_mail::templates::{self, PurchaseDetails};
use ventaro_stripe::{CheckoutSessionData, WebhookEvent, parse_event, verify_signature};

use crate::{AppState, error::ApiError, notify};

const SOURCE: &str = "stripe_webhook";

/// Recorded when neither the metadata nor the product name identifies the
/// product. Reconciliation can repair it once the catalog learns the name.
pub const UNMAPPED_PRODUCT: &str = "unmapped";

/// `POST /webhooks/stripe`
pub async fn stripe<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Value>, ApiError> {
  let secret = &state.config.webhook_secret;
  if secret.is_empty() {
    tracing::warn!("webhook secret not configured; skipping signature verification");
  } else {
    let header = headers
      .get("stripe-signature")
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default();
    let verified = verify_signature(
      &body,
      header,
      secret,
      state.config.webhook_tolerance_secs,
      Utc::now().timestamp(),
    );
    if let Err(e) = verified {
      tracing::warn!(error = %e, "rejected stripe webhook");
      notify::system_log(
        &state,
        NewSystemLog::warn(SOURCE, "rejected webhook signature", json!({ "error": e.to_string() })),
      )
      .await;
      return Err(ApiError::BadRequest("invalid signature".into()));
    }
  }

  let parsed = parse_event(&body).map_err(|e| {
    tracing::warn!(error = %e, "unreadable stripe webhook payload");
    ApiError::BadRequest(format!("invalid payload: {e}"))
  })?;

  tracing::info!(event_id = %parsed.id, event_type = %parsed.event_type, "stripe webhook received");

  let mut entry = match parsed.event {
    WebhookEvent::CheckoutCompleted(session) => complete(&state, session).await?,
    WebhookEvent::CheckoutFailed(session) => settle(&state, session, PurchaseStatus::Failed).await?,
    WebhookEvent::CheckoutExpired(session) => {
      settle(&state, session, PurchaseStatus::Cancelled).await?
    }
    WebhookEvent::Unknown => NewSystemLog::info(SOURCE, "ignored event", json!({})),
  };

  if let Value::Object(map) = &mut entry.details {
    map.insert("event_id".into(), json!(parsed.id));
    map.insert("event_type".into(), json!(parsed.event_type));
  }
  notify::system_log(&state, entry).await;

  Ok(Json(json!({ "received": true })))
}

// ─── Completed ───────────────────────────────────────────────────────────────

async fn complete<S: Storefront>(
  state: &AppState<S>,
  session: CheckoutSessionData,
) -> Result<NewSystemLog, ApiError> {
  let store = &*state.store;
  let existing = store
    .get_purchase_by_session(&session.session_id)
    .await
    .map_err(ApiError::store)?;

  let Some(customer_email) = session
    .customer_email
    .clone()
    .or_else(|| existing.as_ref().map(|p| p.customer_email.clone()))
  else {
    tracing::error!(session_id = %session.session_id, "completed session carries no customer email");
    return Ok(NewSystemLog::error(
      SOURCE,
      "completed session without customer email",
      json!({ "session_id": session.session_id }),
    ));
  };

  let product_id = session
    .product_id
    .clone()
    .or_else(|| {
      session
        .product_name
        .as_deref()
        .and_then(map_stripe_product_to_internal)
        .map(str::to_owned)
    })
    .or_else(|| existing.as_ref().map(|p| p.product_id.clone()))
    .unwrap_or_else(|| UNMAPPED_PRODUCT.to_owned());

  // Only link profiles that exist; metadata is not trusted blindly.
  let user_id = match session.user_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()) {
    Some(id) => store
      .get_profile(id)
      .await
      .map_err(ApiError::store)?
      .map(|p| p.id),
    None => None,
  };

  if session.payment_status.as_deref() == Some("unpaid") {
    return await_payment(state, session, existing, customer_email, product_id, user_id).await;
  }

  let outcome = store
    .complete_session(CompletedSession {
      stripe_session_id: session.session_id.clone(),
      user_id,
      customer_email,
      product_id,
      product_name: session.product_name.clone(),
      amount: session.amount_total,
      currency: session.currency.clone(),
    })
    .await
    .map_err(ApiError::store)?;

  let purchase = &outcome.purchase;
  if !outcome.newly_completed {
    tracing::info!(session_id = %purchase.stripe_session_id, "duplicate completion ignored");
    return Ok(NewSystemLog::info(
      SOURCE,
      "checkout session already completed",
      json!({ "session_id": purchase.stripe_session_id, "purchase_id": purchase.id }),
    ));
  }

  tracing::info!(
    session_id = %purchase.stripe_session_id,
    purchase_id = %purchase.id,
    product_id = %purchase.product_id,
    "purchase completed"
  );
  send_purchase_emails(state, purchase).await;

  Ok(NewSystemLog::info(
    SOURCE,
    "checkout session completed",
    json!({
      "session_id": purchase.stripe_session_id,
      "purchase_id": purchase.id,
      "product_id": purchase.product_id,
      "customer_email": purchase.customer_email,
    }),
  ))
}

/// Delayed payment methods complete the session before the money arrives.
/// The purchase stays `pending` until `async_payment_succeeded` or
/// `async_payment_failed` settles it.
async fn await_payment<S: Storefront>(
  state: &AppState<S>,
  session: CheckoutSessionData,
  existing: Option<Purchase>,
  customer_email: String,
  product_id: String,
  user_id: Option<Uuid>,
) -> Result<NewSystemLog, ApiError> {
  let purchase = match existing {
    Some(purchase) => purchase,
    None => state
      .store
      .create_purchase(NewPurchase {
        user_id,
        customer_email,
        product_id,
        product_name: session.product_name.clone(),
        stripe_session_id: session.session_id.clone(),
        amount: session.amount_total,
        currency: session.currency.clone(),
      })
      .await
      .map_err(ApiError::store)?,
  };

  tracing::info!(
    session_id = %purchase.stripe_session_id,
    purchase_id = %purchase.id,
    status = %purchase.status,
    "checkout session awaiting payment"
  );
  Ok(NewSystemLog::info(
    SOURCE,
    "checkout session awaiting payment",
    json!({
      "session_id": purchase.stripe_session_id,
      "purchase_id": purchase.id,
      "status": purchase.status,
    }),
  ))
}

async fn send_purchase_emails<S: Storefront>(state: &AppState<S>, purchase: &Purchase) {
  let catalog_name = match state.store.get_product(&purchase.product_id).await {
    Ok(product) => product.map(|p| p.name),
    Err(e) => {
      tracing::warn!(error = %e, "product lookup for email failed");
      None
    }
  };
  let product_name = catalog_name
    .or_else(|| purchase.product_name.clone())
    .unwrap_or_else(|| purchase.product_id.clone());

  let details = PurchaseDetails {
    customer_email: &purchase.customer_email,
    product_name:   &product_name,
    amount:         purchase.amount,
    currency:       &purchase.currency,
    session_id:     &purchase.stripe_session_id,
  };

  notify::send_email(state, templates::purchase_confirmation(&details, &state.config.site_url))
    .await;
  if !state.config.admin_email.is_empty() {
    notify::send_email(state, templates::admin_new_purchase(&state.config.admin_email, &details))
      .await;
  }
}

// ─── Failed / expired ────────────────────────────────────────────────────────

async fn settle<S: Storefront>(
  state: &AppState<S>,
  session: CheckoutSessionData,
  status: PurchaseStatus,
) -> Result<NewSystemLog, ApiError> {
  let existing = state
    .store
    .get_purchase_by_session(&session.session_id)
    .await
    .map_err(ApiError::store)?;

  let Some(purchase) = existing else {
    return Ok(NewSystemLog::warn(
      SOURCE,
      "event for unknown checkout session",
      json!({ "session_id": session.session_id, "status": status }),
    ));
  };

  if purchase.status == status || !purchase.status.can_transition_to(status) {
    return Ok(NewSystemLog::info(
      SOURCE,
      "purchase status left unchanged",
      json!({ "purchase_id": purchase.id, "current": purchase.status, "requested": status }),
    ));
  }

  let updated = state
    .store
    .set_purchase_status(purchase.id, status)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(purchase_id = %updated.id, status = %updated.status, "purchase settled");

  Ok(NewSystemLog::warn(
    SOURCE,
    format!("purchase marked {status}"),
    json!({ "purchase_id": updated.id, "session_id": updated.stripe_session_id }),
  ))
}
