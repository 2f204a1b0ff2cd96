//! Admin endpoints. Every handler requires an [`AdminUser`].
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/admin/dashboard` | [`DashboardStats`] |
//! | `GET`   | `/admin/products` | Includes inactive products |
//! | `POST`  | `/admin/products` | 201; 409 if the code exists |
//! | `PATCH` | `/admin/products/:id` | Partial update |
//! | `GET`   | `/admin/purchases` | `?status=` filter |
//! | `POST`  | `/admin/purchases/reconcile` | Re-map product codes from Stripe names |
//! | `GET`   | `/admin/bookings` | All bookings |
//! | `PATCH` | `/admin/bookings/:id` | Body `{"status"}`; 409 on a forbidden transition |
//! | `GET`   | `/admin/logs/email` | `?limit=` (default 100, max 500) |
//! | `GET`   | `/admin/logs/system` | `?limit=` (default 100, max 500) |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use ventaro_core::{
  audit::{EmailLog, NewSystemLog, SystemLog},
  booking::{BookingStatus, CoachingBooking},
  catalog::{self, ReconcileReport},
  product::{NewProduct, Product, ProductUpdate},
  purchase::{Purchase, PurchaseFilter, PurchaseStatus},
  store::{DashboardStats, Storefront},
};
use ventaro_mail::templates;

use crate::{
  AppState,
  auth::AdminUser,
  bookings,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
  notify,
};

pub const DEFAULT_LOG_LIMIT: usize = 100;
pub const MAX_LOG_LIMIT: usize = 500;

/// `GET /admin/dashboard`
pub async fn dashboard<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<DashboardStats>, ApiError> {
  let stats = state.store.dashboard_stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

// ─── Products ────────────────────────────────────────────────────────────────

/// `GET /admin/products`
pub async fn list_products<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<Product>>, ApiError> {
  let products = state
    .store
    .list_products(false)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(products))
}

fn is_valid_code(id: &str) -> bool {
  !id.is_empty()
    && id
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// A three-letter ISO 4217 code, already lowercased.
fn is_valid_currency(currency: &str) -> bool {
  currency.len() == 3 && currency.chars().all(|c| c.is_ascii_lowercase())
}

/// `POST /admin/products`
pub async fn create_product<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ApiJson(mut body): ApiJson<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
  if !is_valid_code(&body.id) {
    return Err(ApiError::BadRequest(
      "id must be lowercase letters, digits and dashes".into(),
    ));
  }
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }
  if body.price < 0 {
    return Err(ApiError::BadRequest("price must not be negative".into()));
  }
  body.currency = body.currency.trim().to_lowercase();
  if !is_valid_currency(&body.currency) {
    return Err(ApiError::BadRequest("currency must be a three-letter code".into()));
  }

  let existing = state
    .store
    .get_product(&body.id)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!("product {} already exists", body.id)));
  }

  let product = state
    .store
    .upsert_product(body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(product_id = %product.id, admin = %admin.email, "product created");
  Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /admin/products/:id`
pub async fn update_product<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ApiPath(id): ApiPath<String>,
  ApiJson(mut update): ApiJson<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
  if update.price.is_some_and(|p| p < 0) {
    return Err(ApiError::BadRequest("price must not be negative".into()));
  }
  if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
    return Err(ApiError::BadRequest("name must not be blank".into()));
  }
  if let Some(currency) = &mut update.currency {
    *currency = currency.trim().to_lowercase();
    if !is_valid_currency(currency) {
      return Err(ApiError::BadRequest("currency must be a three-letter code".into()));
    }
  }

  let product = state
    .store
    .update_product(&id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
  tracing::info!(product_id = %product.id, admin = %admin.email, "product updated");
  Ok(Json(product))
}

// ─── Purchases ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseQuery {
  pub status: Option<PurchaseStatus>,
}

/// `GET /admin/purchases`
pub async fn list_purchases<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ApiQuery(query): ApiQuery<PurchaseQuery>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
  let filter = PurchaseFilter { owner: None, status: query.status };
  let purchases = state
    .store
    .list_purchases(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(purchases))
}

/// `POST /admin/purchases/reconcile`
pub async fn reconcile<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
) -> Result<Json<ReconcileReport>, ApiError> {
  let report = catalog::reconcile(&*state.store)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    examined = report.examined,
    fixed = report.fixes.len(),
    unmapped = report.unmapped.len(),
    "purchases reconciled"
  );
  notify::system_log(
    &state,
    NewSystemLog::info(
      "reconcile",
      "purchase product codes reconciled",
      json!({
        "admin": admin.email,
        "examined": report.examined,
        "fixed": report.fixes.len(),
        "unmapped": report.unmapped.len(),
      }),
    ),
  )
  .await;

  Ok(Json(report))
}

// ─── Bookings ────────────────────────────────────────────────────────────────

/// `GET /admin/bookings`
pub async fn list_bookings<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<CoachingBooking>>, ApiError> {
  let bookings = state
    .store
    .list_bookings(None)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bookings))
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusBody {
  pub status: BookingStatus,
}

/// `PATCH /admin/bookings/:id`
pub async fn update_booking<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<BookingStatusBody>,
) -> Result<Json<CoachingBooking>, ApiError> {
  let booking = state
    .store
    .get_booking(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("booking {id} not found")))?;

  if let Err(e) = booking.status.check_transition(body.status) {
    return Err(ApiError::Conflict(e.to_string()));
  }

  let updated = state
    .store
    .set_booking_status(id, body.status)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    booking_id = %updated.id,
    from = %booking.status,
    to = %updated.status,
    admin = %admin.email,
    "booking status changed"
  );

  notify::send_email(
    &state,
    templates::booking_status_changed(&bookings::details(&updated), updated.status.as_ref()),
  )
  .await;
  notify::system_log(
    &state,
    NewSystemLog::info(
      "booking",
      format!("booking {}", updated.status),
      json!({ "booking_id": updated.id, "from": booking.status, "admin": admin.email }),
    ),
  )
  .await;

  Ok(Json(updated))
}

// ─── Logs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
  pub limit: Option<usize>,
}

impl LogQuery {
  fn limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
  }
}

/// `GET /admin/logs/email`
pub async fn email_logs<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ApiQuery(query): ApiQuery<LogQuery>,
) -> Result<Json<Vec<EmailLog>>, ApiError> {
  let logs = state
    .store
    .list_email_logs(query.limit())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(logs))
}

/// `GET /admin/logs/system`
pub async fn system_logs<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ApiQuery(query): ApiQuery<LogQuery>,
) -> Result<Json<Vec<SystemLog>>, ApiError> {
  let logs = state
    .store
    .list_system_logs(query.limit())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(logs))
}
