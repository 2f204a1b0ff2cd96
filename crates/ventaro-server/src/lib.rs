//! Configuration and wiring for the `ventaro` binary.
//!
//! Settings come from a TOML file (default `config.toml`, optional) overlaid
//! with `VENTARO_`-prefixed environment variables. Nested keys use a double
//! underscore: `VENTARO_STRIPE__SECRET_KEY` sets `stripe.secret_key`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use ventaro_api::{ApiConfig, AppState, RateLimiter};
use ventaro_mail::{SendGridConfig, SendGridMailer};
use ventaro_store_sqlite::SqliteStore;
use ventaro_stripe::{StripeClient, StripeConfig};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  /// Public storefront URL, used in redirects and email links.
  #[serde(default = "default_site_url")]
  pub site_url:      String,
  /// Receives purchase and booking notifications. Empty disables them.
  #[serde(default)]
  pub admin_email:   String,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  #[serde(default = "default_downloads_dir")]
  pub downloads_dir: PathBuf,
  #[serde(default)]
  pub stripe:        StripeConfig,
  #[serde(default)]
  pub sendgrid:      SendGridConfig,
  #[serde(default)]
  pub booking:       BookingLimits,
}

/// Booking requests allowed per email address in a rolling window.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingLimits {
  #[serde(default = "default_max_attempts")]
  pub max_attempts: usize,
  #[serde(default = "default_window_hours")]
  pub window_hours: u64,
}

impl Default for BookingLimits {
  fn default() -> Self {
    Self { max_attempts: default_max_attempts(), window_hours: default_window_hours() }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_site_url() -> String { "http://localhost:8080".to_owned() }
fn default_store_path() -> PathBuf { PathBuf::from("ventaro.db") }
fn default_downloads_dir() -> PathBuf { PathBuf::from("downloads") }
fn default_max_attempts() -> usize { 2 }
fn default_window_hours() -> u64 { 24 }

impl ServerConfig {
  /// Read `path` (if it exists) and the `VENTARO_*` environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("VENTARO")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      site_url:               self.site_url.trim_end_matches('/').to_owned(),
      admin_email:            self.admin_email.trim().to_owned(),
      webhook_secret:         self.stripe.webhook_secret.clone(),
      webhook_tolerance_secs: self.stripe.tolerance_secs,
      downloads_dir:          expand_tilde(&self.downloads_dir),
    }
  }

  pub fn rate_limiter(&self) -> RateLimiter {
    RateLimiter::new(
      self.booking.max_attempts,
      Duration::from_secs(self.booking.window_hours * 60 * 60),
    )
  }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Open the configured store, creating the schema if needed.
pub async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(&cfg.store_path);
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

/// Build handler state with the real Stripe and SendGrid clients.
pub fn build_state(cfg: &ServerConfig, store: SqliteStore) -> anyhow::Result<AppState<SqliteStore>> {
  let stripe = StripeClient::new(cfg.stripe.clone()).context("failed to build stripe client")?;
  if !stripe.is_configured() {
    tracing::warn!("stripe.secret_key is empty; checkout will fail");
  }
  if cfg.stripe.webhook_secret.is_empty() {
    tracing::warn!("stripe.webhook_secret is empty; webhook signatures are not checked");
  }

  let mailer = SendGridMailer::new(cfg.sendgrid.clone()).context("failed to build mail client")?;
  if !mailer.is_enabled() {
    tracing::warn!("sendgrid.api_key is empty; emails will be logged as skipped");
  }

  Ok(AppState {
    store:   Arc::new(store),
    gateway: Arc::new(stripe),
    mailer:  Arc::new(mailer),
    limiter: Arc::new(cfg.rate_limiter()),
    config:  Arc::new(cfg.api_config()),
  })
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let path = std::env::temp_dir().join(format!("ventaro-missing-{}.toml", uuid::Uuid::new_v4()));
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.booking.max_attempts, 2);
    assert_eq!(cfg.booking.window_hours, 24);
    assert_eq!(cfg.stripe.api_base, "https://api.stripe.com");
    assert_eq!(cfg.sendgrid.from_email, "noreply@ventaro.ai");
  }

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir().join(format!("ventaro-config-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      r#"
port = 9000
site_url = "https://ventaro.ai/"
admin_email = "admin@ventaro.ai"

[stripe]
secret_key = "sk_test_123"
webhook_secret = "whsec_123"

[booking]
max_attempts = 5
"#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.address(), "127.0.0.1:9000");
    assert_eq!(cfg.stripe.secret_key, "sk_test_123");
    assert_eq!(cfg.stripe.tolerance_secs, 300);
    assert_eq!(cfg.booking.max_attempts, 5);
    assert_eq!(cfg.booking.window_hours, 24);

    let api = cfg.api_config();
    assert_eq!(api.site_url, "https://ventaro.ai");
    assert_eq!(api.webhook_secret, "whsec_123");
  }

  #[test]
  fn tilde_expansion() {
    let plain = PathBuf::from("/var/lib/ventaro.db");
    assert_eq!(expand_tilde(&plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/ventaro.db")), PathBuf::from(home).join("ventaro.db"));
    }
  }
}
