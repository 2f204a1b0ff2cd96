//! Coaching bookings submitted through the consultation form.

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
pub enum BookingStatus {
  Pending,
  Confirmed,
  Completed,
  Cancelled,
}

impl BookingStatus {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }

  /// `pending → confirmed | cancelled`, `confirmed → completed | cancelled`.
  pub fn can_transition_to(self, next: Self) -> bool {
    use BookingStatus::*;
    matches!(
      (self, next),
      (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
    )
  }

  pub fn check_transition(self, next: Self) -> Result<()> {
    if self.can_transition_to(next) {
      Ok(())
    } else {
      Err(Error::InvalidBookingTransition { from: self, to: next })
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingBooking {
  pub id:             Uuid,
  pub user_id:        Option<Uuid>,
  pub name:           String,
  pub email:          String,
  /// Free-form date as entered, e.g. `2025-03-14`.
  pub preferred_date: String,
  pub preferred_time: String,
  pub timezone:       String,
  pub message:        Option<String>,
  pub status:         BookingStatus,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`crate::store::Storefront::create_booking`]. Bookings always
/// start `Pending`.
#[derive(Debug, Clone)]
pub struct NewBooking {
  pub user_id:        Option<Uuid>,
  pub name:           String,
  pub email:          String,
  pub preferred_date: String,
  pub preferred_time: String,
  pub timezone:       String,
  pub message:        Option<String>,
}

#[cfg(test)]
mod tests {
  use super::BookingStatus::*;

  #[test]
  fn allowed_transitions() {
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Pending.can_transition_to(Cancelled));
    assert!(Confirmed.can_transition_to(Completed));
    assert!(Confirmed.can_transition_to(Cancelled));
  }

  #[test]
  fn rejected_transitions() {
    assert!(!Pending.can_transition_to(Completed));
    assert!(!Pending.can_transition_to(Pending));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Confirmed));
    assert!(Completed.check_transition(Pending).is_err());
  }

  #[test]
  fn terminal_states() {
    assert!(Completed.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Pending.is_terminal());
  }
}
