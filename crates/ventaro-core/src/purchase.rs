//! Purchases: the entitlement records linking a buyer to a product code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PurchaseStatus {
  Pending,
  Completed,
  Failed,
  Cancelled,
}

impl PurchaseStatus {
  /// Whether a purchase may move from `self` to `next`.
  ///
  /// Re-applying the current status is allowed so webhook redelivery is a
  /// no-op. A completed purchase never leaves `Completed`; a failed or
  /// cancelled one may still complete when Stripe settles late.
  pub fn can_transition_to(self, next: Self) -> bool {
    use PurchaseStatus::*;
    match (self, next) {
      (a, b) if a == b => true,
      (Pending, _) => true,
      (Failed | Cancelled, Completed) => true,
      _ => false,
    }
  }

  pub fn check_transition(self, next: Self) -> Result<()> {
    if self.can_transition_to(next) {
      Ok(())
    } else {
      Err(Error::InvalidPurchaseTransition { from: self, to: next })
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
  pub id:                Uuid,
  /// The buyer's profile, when the checkout was started by a signed-in user.
  pub user_id:           Option<Uuid>,
  pub customer_email:    String,
  /// Internal product code.
  pub product_id:        String,
  /// Product name as Stripe reported it; the input to reconciliation.
  pub product_name:      Option<String>,
  pub stripe_session_id: String,
  /// Amount in minor currency units.
  pub amount:            i64,
  pub currency:          String,
  pub status:            PurchaseStatus,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

/// Input to [`crate::store::Storefront::create_purchase`]. The purchase is
/// always created `Pending`.
#[derive(Debug, Clone)]
pub struct NewPurchase {
  pub user_id:           Option<Uuid>,
  pub customer_email:    String,
  pub product_id:        String,
  pub product_name:      Option<String>,
  pub stripe_session_id: String,
  pub amount:            i64,
  pub currency:          String,
}

/// What a `checkout.session.completed` webhook tells us about a session.
///
/// Used to complete an existing pending purchase, or to insert a completed
/// one when the checkout did not go through this server.
#[derive(Debug, Clone)]
pub struct CompletedSession {
  pub stripe_session_id: String,
  pub user_id:           Option<Uuid>,
  pub customer_email:    String,
  pub product_id:        String,
  pub product_name:      Option<String>,
  pub amount:            i64,
  pub currency:          String,
}

/// Result of [`crate::store::Storefront::complete_session`].
#[derive(Debug, Clone)]
pub struct SessionOutcome {
  pub purchase:         Purchase,
  /// `true` only on the call that moved the purchase into `Completed`.
  pub newly_completed:  bool,
}

/// Restricts the output of [`crate::store::Storefront::list_purchases`].
#[derive(Debug, Clone, Default)]
pub struct PurchaseFilter {
  /// Purchases belonging to this buyer.
  pub owner:  Option<Owner>,
  pub status: Option<PurchaseStatus>,
}

/// A buyer identity. Purchases inserted straight from Stripe may only carry
/// the email. Profile emails are unverified, so matching by `email` is for
/// admin views and never grants access.
#[derive(Debug, Clone)]
pub struct Owner {
  pub user_id: Uuid,
  pub email:   Option<String>,
}

#[cfg(test)]
mod tests {
  use super::PurchaseStatus::*;

  #[test]
  fn pending_moves_anywhere() {
    for next in [Pending, Completed, Failed, Cancelled] {
      assert!(Pending.can_transition_to(next), "{next}");
    }
  }

  #[test]
  fn completed_is_terminal() {
    assert!(Completed.can_transition_to(Completed));
    assert!(!Completed.can_transition_to(Failed));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Completed.can_transition_to(Pending));
  }

  #[test]
  fn late_settlement_completes_failed_purchase() {
    assert!(Failed.can_transition_to(Completed));
    assert!(Cancelled.can_transition_to(Completed));
    assert!(!Failed.can_transition_to(Pending));
    assert!(Cancelled.check_transition(Failed).is_err());
  }
}
