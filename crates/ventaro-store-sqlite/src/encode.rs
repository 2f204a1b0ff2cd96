//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so lexical order matches chronological order.
//! Enums are stored as their lowercase / snake_case names. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use ventaro_core::{
  audit::{EmailLog, SystemLog},
  booking::CoachingBooking,
  product::Product,
  profile::Profile,
  purchase::Purchase,
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Parse a text column into one of the `strum`-derived domain enums.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue {
    column,
    value: s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str =
  "id, email, name, password_hash, role, created_at, last_login_at";

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub id:            String,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub role:          String,
  pub created_at:    String,
  pub last_login_at: Option<String>,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      email:         row.get(1)?,
      name:          row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      created_at:    row.get(5)?,
      last_login_at: row.get(6)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:            decode_uuid(&self.id)?,
      email:         self.email,
      name:          self.name,
      password_hash: self.password_hash,
      role:          decode_enum("role", &self.role)?,
      created_at:    decode_dt(&self.created_at)?,
      last_login_at: decode_opt_dt(self.last_login_at)?,
    })
  }
}

pub const PRODUCT_COLUMNS: &str = "id, name, description, price, currency, \
  stripe_price_id, category, is_active, download_file, created_at, updated_at";

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub id:              String,
  pub name:            String,
  pub description:     String,
  pub price:           i64,
  pub currency:        String,
  pub stripe_price_id: Option<String>,
  pub category:        String,
  pub is_active:       bool,
  pub download_file:   Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      name:            row.get(1)?,
      description:     row.get(2)?,
      price:           row.get(3)?,
      currency:        row.get(4)?,
      stripe_price_id: row.get(5)?,
      category:        row.get(6)?,
      is_active:       row.get(7)?,
      download_file:   row.get(8)?,
      created_at:      row.get(9)?,
      updated_at:      row.get(10)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      id:              self.id,
      name:            self.name,
      description:     self.description,
      price:           self.price,
      currency:        self.currency,
      stripe_price_id: self.stripe_price_id,
      category:        decode_enum("category", &self.category)?,
      is_active:       self.is_active,
      download_file:   self.download_file,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub const PURCHASE_COLUMNS: &str = "id, user_id, customer_email, product_id, \
  product_name, stripe_session_id, amount, currency, status, created_at, updated_at";

/// Raw values read directly from a `purchases` row.
pub struct RawPurchase {
  pub id:                String,
  pub user_id:           Option<String>,
  pub customer_email:    String,
  pub product_id:        String,
  pub product_name:      Option<String>,
  pub stripe_session_id: String,
  pub amount:            i64,
  pub currency:          String,
  pub status:            String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawPurchase {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      user_id:           row.get(1)?,
      customer_email:    row.get(2)?,
      product_id:        row.get(3)?,
      product_name:      row.get(4)?,
      stripe_session_id: row.get(5)?,
      amount:            row.get(6)?,
      currency:          row.get(7)?,
      status:            row.get(8)?,
      created_at:        row.get(9)?,
      updated_at:        row.get(10)?,
    })
  }

  pub fn into_purchase(self) -> Result<Purchase> {
    Ok(Purchase {
      id:                decode_uuid(&self.id)?,
      user_id:           decode_opt_uuid(self.user_id)?,
      customer_email:    self.customer_email,
      product_id:        self.product_id,
      product_name:      self.product_name,
      stripe_session_id: self.stripe_session_id,
      amount:            self.amount,
      currency:          self.currency,
      status:            decode_enum("status", &self.status)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

pub const BOOKING_COLUMNS: &str = "id, user_id, name, email, preferred_date, \
  preferred_time, timezone, message, status, created_at, updated_at";

/// Raw values read directly from a `coaching_bookings` row.
pub struct RawBooking {
  pub id:             String,
  pub user_id:        Option<String>,
  pub name:           String,
  pub email:          String,
  pub preferred_date: String,
  pub preferred_time: String,
  pub timezone:       String,
  pub message:        Option<String>,
  pub status:         String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawBooking {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      user_id:        row.get(1)?,
      name:           row.get(2)?,
      email:          row.get(3)?,
      preferred_date: row.get(4)?,
      preferred_time: row.get(5)?,
      timezone:       row.get(6)?,
      message:        row.get(7)?,
      status:         row.get(8)?,
      created_at:     row.get(9)?,
      updated_at:     row.get(10)?,
    })
  }

  pub fn into_booking(self) -> Result<CoachingBooking> {
    Ok(CoachingBooking {
      id:             decode_uuid(&self.id)?,
      user_id:        decode_opt_uuid(self.user_id)?,
      name:           self.name,
      email:          self.email,
      preferred_date: self.preferred_date,
      preferred_time: self.preferred_time,
      timezone:       self.timezone,
      message:        self.message,
      status:         decode_enum("status", &self.status)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub const EMAIL_LOG_COLUMNS: &str =
  "id, recipient, subject, kind, status, error, created_at";

/// Raw strings read directly from an `email_logs` row.
pub struct RawEmailLog {
  pub id:         String,
  pub recipient:  String,
  pub subject:    String,
  pub kind:       String,
  pub status:     String,
  pub error:      Option<String>,
  pub created_at: String,
}

impl RawEmailLog {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      recipient:  row.get(1)?,
      subject:    row.get(2)?,
      kind:       row.get(3)?,
      status:     row.get(4)?,
      error:      row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_log(self) -> Result<EmailLog> {
    Ok(EmailLog {
      id:         decode_uuid(&self.id)?,
      recipient:  self.recipient,
      subject:    self.subject,
      kind:       self.kind,
      status:     decode_enum("status", &self.status)?,
      error:      self.error,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const SYSTEM_LOG_COLUMNS: &str = "id, level, source, message, details, created_at";

/// Raw strings read directly from a `system_logs` row.
pub struct RawSystemLog {
  pub id:         String,
  pub level:      String,
  pub source:     String,
  pub message:    String,
  pub details:    String,
  pub created_at: String,
}

impl RawSystemLog {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      level:      row.get(1)?,
      source:     row.get(2)?,
      message:    row.get(3)?,
      details:    row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_log(self) -> Result<SystemLog> {
    Ok(SystemLog {
      id:         decode_uuid(&self.id)?,
      level:      decode_enum("level", &self.level)?,
      source:     self.source,
      message:    self.message,
      details:    serde_json::from_str(&self.details)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use ventaro_core::purchase::PurchaseStatus;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn unknown_enum_value_is_reported() {
    let err = decode_enum::<PurchaseStatus>("status", "refunded").unwrap_err();
    assert!(matches!(err, Error::UnknownValue { column: "status", .. }));
  }
}
