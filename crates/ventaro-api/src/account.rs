//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Body: [`SignupBody`]; 201 + profile, 409 on duplicate email |
//! | `POST` | `/auth/login`  | Body: [`LoginBody`]; 401 on bad credentials |
//! | `GET`  | `/auth/me`     | The authenticated profile |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use ventaro_core::{
  is_plausible_email,
  profile::{NewProfile, Profile, Role},
  store::Storefront,
};

use crate::{
  AppState,
  auth::{AuthUser, authenticate, hash_password},
  error::ApiError,
  extract::ApiJson,
};

pub const MIN_PASSWORD_LEN: usize = 8;

// ─── Signup ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub email:    String,
  pub name:     String,
  pub password: String,
}

/// `POST /auth/signup`
pub async fn signup<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<SignupBody>,
) -> Result<impl IntoResponse, ApiError> {
  if !is_plausible_email(&body.email) {
    return Err(ApiError::BadRequest("a valid email address is required".into()));
  }
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let existing = state
    .store
    .get_profile_by_email(&body.email)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict("an account with this email already exists".into()));
  }

  let profile = state
    .store
    .create_profile(NewProfile {
      email:         body.email,
      name:          body.name,
      password_hash: hash_password(&body.password)?,
      role:          Role::User,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(profile_id = %profile.id, email = %profile.email, "profile created");
  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<Profile>, ApiError> {
  let profile = authenticate(&*state.store, &body.email, &body.password).await?;
  let profile = state
    .store
    .record_login(profile.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

// ─── Me ──────────────────────────────────────────────────────────────────────

/// `GET /auth/me`
pub async fn me(AuthUser(profile): AuthUser) -> Json<Profile> { Json(profile) }
