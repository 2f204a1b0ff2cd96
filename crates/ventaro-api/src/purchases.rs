//! Buyer-facing purchase endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/purchases` | Caller's purchases, newest first |
//! | `GET`  | `/entitlements/:product_id` | `{"product_id", "has_access"}` |
//! | `GET`  | `/downloads/:product_id` | File bytes; 403 without a completed purchase |

use std::path::Path as FsPath;

use axum::{
  Json,
  extract::State,
  http::header,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use ventaro_core::{
  profile::Profile,
  purchase::{Owner, Purchase, PurchaseFilter},
  store::Storefront,
};

use crate::{AppState, auth::AuthUser, error::ApiError, extract::ApiPath};

/// Purchases linked to the profile id. Guest purchases under the same email
/// are not included.
pub(crate) fn owner_of(profile: &Profile) -> Owner {
  Owner { user_id: profile.id, email: None }
}

/// `GET /purchases`
pub async fn list_mine<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AuthUser(profile): AuthUser,
) -> Result<Json<Vec<Purchase>>, ApiError> {
  let filter = PurchaseFilter { owner: Some(owner_of(&profile)), status: None };
  let purchases = state
    .store
    .list_purchases(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(purchases))
}

// ─── Entitlements ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Entitlement {
  pub product_id: String,
  pub has_access: bool,
}

/// `GET /entitlements/:product_id`
pub async fn entitlement<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AuthUser(profile): AuthUser,
  ApiPath(product_id): ApiPath<String>,
) -> Result<Json<Entitlement>, ApiError> {
  let has_access = state
    .store
    .has_entitlement(profile.id, &product_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Entitlement { product_id, has_access }))
}

// ─── Downloads ───────────────────────────────────────────────────────────────

/// `GET /downloads/:product_id`
pub async fn download<S: Storefront + 'static>(
  State(state): State<AppState<S>>,
  AuthUser(profile): AuthUser,
  ApiPath(product_id): ApiPath<String>,
) -> Result<Response, ApiError> {
  // Inactive products stay downloadable for people who already bought them.
  let product = state
    .store
    .get_product(&product_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;

  let entitled = state
    .store
    .has_entitlement(profile.id, &product.id)
    .await
    .map_err(ApiError::store)?;
  if !entitled {
    tracing::info!(user_id = %profile.id, product_id = %product.id, "download refused");
    return Err(ApiError::Forbidden("purchase required".into()));
  }

  let file_name = product
    .download_file
    .as_deref()
    .and_then(safe_file_name)
    .ok_or_else(|| ApiError::NotFound(format!("{} has no downloadable file", product.id)))?;

  let path = state.config.downloads_dir.join(file_name);
  let bytes = match tokio::fs::read(&path).await {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      tracing::error!(path = %path.display(), "download file missing");
      return Err(ApiError::NotFound(format!("{} file unavailable", product.id)));
    }
    Err(e) => return Err(ApiError::Internal(format!("reading {}: {e}", path.display()))),
  };

  tracing::info!(user_id = %profile.id, product_id = %product.id, "download served");
  Ok(
    (
      [
        (header::CONTENT_TYPE, content_type(file_name).to_owned()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
      ],
      bytes,
    )
      .into_response(),
  )
}

/// Accept only a bare file name: no directories, no `..`.
fn safe_file_name(name: &str) -> Option<&str> {
  let file = FsPath::new(name).file_name()?.to_str()?;
  (file == name && !name.starts_with('.')).then_some(name)
}

fn content_type(file_name: &str) -> &'static str {
  match FsPath::new(file_name).extension().and_then(|e| e.to_str()) {
    Some("pdf") => "application/pdf",
    Some("zip") => "application/zip",
    Some("txt") | Some("md") => "text/plain; charset=utf-8",
    _ => "application/octet-stream",
  }
}
