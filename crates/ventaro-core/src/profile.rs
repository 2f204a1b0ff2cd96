//! Profiles: the people who can sign in to the storefront.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access level of a profile.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  User,
}

/// A stored profile. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub id:            Uuid,
  /// Always stored lowercase; unique across profiles.
  pub email:         String,
  pub name:          String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub role:          Role,
  pub created_at:    DateTime<Utc>,
  pub last_login_at: Option<DateTime<Utc>>,
}

impl Profile {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input to [`crate::store::Storefront::create_profile`].
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub role:          Role,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_string_forms_agree() {
    assert_eq!(Role::Admin.to_string(), "admin");
    assert_eq!("user".parse::<Role>().unwrap(), Role::User);
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
  }

  #[test]
  fn password_hash_is_not_serialised() {
    let profile = Profile {
      id:            Uuid::nil(),
      email:         "a@example.com".into(),
      name:          "A".into(),
      password_hash: "$argon2id$secret".into(),
      role:          Role::User,
      created_at:    Utc::now(),
      last_login_at: None,
    };
    let json = serde_json::to_string(&profile).unwrap();
    assert!(!json.contains("argon2"), "{json}");
  }
}
