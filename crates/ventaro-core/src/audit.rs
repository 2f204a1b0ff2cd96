//! Append-only audit records written by the server: one row per email
//! dispatch attempt and one per notable system event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmailStatus {
  Sent,
  Failed,
  /// No mail provider configured; nothing left the server.
  Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLog {
  pub id:         Uuid,
  pub recipient:  String,
  pub subject:    String,
  /// Template name, e.g. `purchase_confirmation`.
  pub kind:       String,
  pub status:     EmailStatus,
  pub error:      Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmailLog {
  pub recipient: String,
  pub subject:   String,
  pub kind:      String,
  pub status:    EmailStatus,
  pub error:     Option<String>,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
  Info,
  Warn,
  Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemLog {
  pub id:         Uuid,
  pub level:      LogLevel,
  /// The component that wrote the row, e.g. `stripe_webhook`.
  pub source:     String,
  pub message:    String,
  pub details:    serde_json::Value,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSystemLog {
  pub level:   LogLevel,
  pub source:  String,
  pub message: String,
  pub details: serde_json::Value,
}

impl NewSystemLog {
  pub fn info(source: &str, message: impl Into<String>, details: serde_json::Value) -> Self {
    Self { level: LogLevel::Info, source: source.to_owned(), message: message.into(), details }
  }

  pub fn warn(source: &str, message: impl Into<String>, details: serde_json::Value) -> Self {
    Self { level: LogLevel::Warn, source: source.to_owned(), message: message.into(), details }
  }

  pub fn error(source: &str, message: impl Into<String>, details: serde_json::Value) -> Self {
    Self { level: LogLevel::Error, source: source.to_owned(), message: message.into(), details }
  }
}
