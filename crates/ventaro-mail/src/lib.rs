//! Transactional email for the Ventaro storefront.
//!
//! [`SendGridMailer`] delivers through the SendGrid v3 API; [`templates`]
//! renders the messages the storefront sends. Callers hold an
//! `Arc<dyn Mailer>` so tests can record instead of send.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub mod templates;

#[derive(Debug, Error)]
pub enum MailError {
  /// No API key configured; nothing was sent.
  #[error("email delivery is disabled")]
  Disabled,

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("sendgrid returned {status}: {body}")]
  Rejected { status: u16, body: String },
}

pub type Result<T, E = MailError> = std::result::Result<T, E>;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
  pub to:      String,
  pub subject: String,
  pub html:    String,
  /// Template name, recorded in the email log.
  pub kind:    &'static str,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: &Email) -> Result<()>;
}

// ─── SendGrid ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SendGridConfig {
  /// Empty disables delivery.
  #[serde(default)]
  pub api_key:    String,
  #[serde(default = "default_from_email")]
  pub from_email: String,
  #[serde(default = "default_from_name")]
  pub from_name:  String,
  #[serde(default = "default_api_base")]
  pub api_base:   String,
}

fn default_from_email() -> String { "noreply@ventaro.ai".to_owned() }
fn default_from_name() -> String { "Ventaro AI".to_owned() }
fn default_api_base() -> String { "https://api.sendgrid.com".to_owned() }

impl Default for SendGridConfig {
  fn default() -> Self {
    Self {
      api_key:    String::new(),
      from_email: default_from_email(),
      from_name:  default_from_name(),
      api_base:   default_api_base(),
    }
  }
}

/// SendGrid v3 `mail/send` client.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SendGridMailer {
  client: Client,
  config: SendGridConfig,
}

impl SendGridMailer {
  pub fn new(config: SendGridConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn is_enabled(&self) -> bool { !self.config.api_key.is_empty() }

  fn body(&self, email: &Email) -> serde_json::Value {
    json!({
      "personalizations": [{ "to": [{ "email": email.to }] }],
      "from": { "email": self.config.from_email, "name": self.config.from_name },
      "subject": email.subject,
      "content": [{ "type": "text/html", "value": email.html }],
    })
  }
}

#[async_trait]
impl Mailer for SendGridMailer {
  async fn send(&self, email: &Email) -> Result<()> {
    if !self.is_enabled() {
      return Err(MailError::Disabled);
    }

    let url = format!("{}/v3/mail/send", self.config.api_base.trim_end_matches('/'));
    let resp = self
      .client
      .post(url)
      .bearer_auth(&self.config.api_key)
      .json(&self.body(email))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(MailError::Rejected { status: status.as_u16(), body });
    }

    tracing::debug!(to = %email.to, kind = email.kind, "email accepted by sendgrid");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn email() -> Email {
    Email {
      to:      "buyer@example.com".into(),
      subject: "Hello".into(),
      html:    "<p>Hi</p>".into(),
      kind:    "test",
    }
  }

  #[test]
  fn request_body_shape() {
    let mailer = SendGridMailer::new(SendGridConfig::default()).unwrap();
    let body = mailer.body(&email());
    assert_eq!(body["personalizations"][0]["to"][0]["email"], "buyer@example.com");
    assert_eq!(body["from"]["email"], "noreply@ventaro.ai");
    assert_eq!(body["content"][0]["type"], "text/html");
    assert_eq!(body["subject"], "Hello");
  }

  #[tokio::test]
  async fn missing_api_key_disables_delivery() {
    let mailer = SendGridMailer::new(SendGridConfig::default()).unwrap();
    assert!(!mailer.is_enabled());
    assert!(matches!(mailer.send(&email()).await, Err(MailError::Disabled)));
  }
}
