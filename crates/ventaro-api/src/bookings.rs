//! Coaching booking endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/consultation-booking` | Auth optional; 2 requests per email per 24 h, then 429 |
//! | `GET`  | `/bookings` | Caller's bookings |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use ventaro_core::{
  audit::NewSystemLog,
  booking::{CoachingBooking, NewBooking},
  is_plausible_email, normalize_email,
  store::Storefront,
};
use ventaro_mail::templates::{self, BookingDetails};

use crate::{
  AppState,
  auth::{AuthUser, MaybeUser},
  error::ApiError,
  extract::ApiJson,
  notify,
};

#[derive(Debug, Deserialize)]
pub struct BookingBody {
  pub name:           String,
  /// Defaults to the signed-in profile's email.
  #[serde(default)]
  pub email:          String,
  /// `YYYY-MM-DD`.
  pub preferred_date: String,
  pub preferred_time: String,
  #[serde(default)]
  pub timezone:       String,
  #[serde(default)]
  pub message:        Option<String>,
}

pub(crate) fn details(b: &CoachingBooking) -> BookingDetails<'_> {
  BookingDetails {
    name:           &b.name,
    email:          &b.email,
    preferred_date: &b.preferred_date,
    preferred_time: &b.preferred_time,
    timezone:       &b.timezone,
    message:        b.message.as_deref(),
  }
}

fn validate(body: BookingBody, user: Option<&ventaro_core::profile::Profile>) -> Result<NewBooking, ApiError> {
  let email = match (body.email.trim(), user) {
    ("", Some(profile)) => profile.email.clone(),
    (email, _) => normalize_email(email),
  };
  if !is_plausible_email(&email) {
    return Err(ApiError::BadRequest("a valid email address is required".into()));
  }

  let name = body.name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }

  let date = body.preferred_date.trim();
  if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
    return Err(ApiError::BadRequest("preferred_date must be YYYY-MM-DD".into()));
  }

  let time = body.preferred_time.trim();
  if time.is_empty() {
    return Err(ApiError::BadRequest("preferred_time is required".into()));
  }

  let timezone = match body.timezone.trim() {
    "" => "UTC".to_owned(),
    tz => tz.to_owned(),
  };

  Ok(NewBooking {
    user_id: user.map(|p| p.id),
    name: name.to_owned(),
    email,
    preferred_date: date.to_owned(),
    preferred_time: time.to_owned(),
    timezone,
    message: body.message.map(|m| m.trim().to_owned()).filter(|m| !m.is_empty()),
  })
}

/// `POST /consultation-booking`
pub async fn create<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  MaybeUser(user): MaybeUser,
  ApiJson(body): ApiJson<BookingBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = validate(body, user.as_ref())?;

  if !state.limiter.try_acquire(&input.email) {
    tracing::warn!(email = %input.email, "booking rate limit hit");
    notify::system_log(
      &state,
      NewSystemLog::warn("booking", "rate limit exceeded", json!({ "email": input.email })),
    )
    .await;
    return Err(ApiError::TooManyRequests(
      "too many booking requests; please try again tomorrow".into(),
    ));
  }

  let email = input.email.clone();
  let booking = match state.store.create_booking(input).await {
    Ok(booking) => booking,
    Err(e) => {
      state.limiter.release(&email);
      return Err(ApiError::store(e));
    }
  };
  tracing::info!(booking_id = %booking.id, email = %booking.email, "booking created");

  notify::send_email(&state, templates::booking_received(&details(&booking))).await;
  if !state.config.admin_email.is_empty() {
    notify::send_email(
      &state,
      templates::admin_new_booking(&state.config.admin_email, &details(&booking)),
    )
    .await;
  }
  notify::system_log(
    &state,
    NewSystemLog::info(
      "booking",
      "coaching booking received",
      json!({ "booking_id": booking.id, "email": booking.email }),
    ),
  )
  .await;

  Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /bookings`
pub async fn list_mine<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AuthUser(profile): AuthUser,
) -> Result<Json<Vec<CoachingBooking>>, ApiError> {
  let bookings = state
    .store
    .list_bookings(Some(&profile.email))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bookings))
}
