//! HTTP Basic-auth extractors and argon2 password helpers.
//!
//! Credentials are `email:password`, checked against the stored profile's
//! argon2 PHC string on every request.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use ventaro_core::{profile::Profile, store::Storefront};

use crate::{AppState, error::ApiError};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Constant-time check of `password` against a PHC string. Malformed hashes
/// never verify.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    .unwrap_or(false)
}

// ─── Basic auth ──────────────────────────────────────────────────────────────

/// Decode `Authorization: Basic ...` into `(email, password)`.
///
/// `Ok(None)` when the header is absent; an error when it is present but
/// unreadable.
fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };

  let encoded = value
    .to_str()
    .ok()
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  Ok(Some((email.to_owned(), password.to_owned())))
}

/// Look up `email` and verify `password`. Unknown email and wrong password
/// are indistinguishable to the caller.
pub(crate) async fn authenticate<S: Storefront>(
  store: &S,
  email: &str,
  password: &str,
) -> Result<Profile, ApiError> {
  let profile = store
    .get_profile_by_email(email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(password, &profile.password_hash) {
    tracing::debug!(email = %profile.email, "password mismatch");
    return Err(ApiError::Unauthorized);
  }
  Ok(profile)
}

async fn current_profile<S: Storefront>(
  parts: &Parts,
  state: &AppState<S>,
) -> Result<Option<Profile>, ApiError> {
  match basic_credentials(&parts.headers)? {
    Some((email, password)) => Ok(Some(authenticate(&*state.store, &email, &password).await?)),
    None => Ok(None),
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// A signed-in buyer. Rejects with 401.
pub struct AuthUser(pub Profile);

/// A signed-in admin. Rejects with 401 without credentials, 403 for
/// non-admins.
pub struct AdminUser(pub Profile);

/// Credentials are optional, but if sent they must be valid.
pub struct MaybeUser(pub Option<Profile>);

impl<S: Storefront + 'static> FromRequestParts<AppState<S>> for AuthUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    current_profile(parts, state)
      .await?
      .map(AuthUser)
      .ok_or(ApiError::Unauthorized)
  }
}

impl<S: Storefront + 'static> FromRequestParts<AppState<S>> for AdminUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let profile = current_profile(parts, state)
      .await?
      .ok_or(ApiError::Unauthorized)?;
    if !profile.is_admin() {
      return Err(ApiError::Forbidden("admin access required".into()));
    }
    Ok(AdminUser(profile))
  }
}

impl<S: Storefront + 'static> FromRequestParts<AppState<S>> for MaybeUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeUser(current_profile(parts, state).await?))
  }
}
