//! Error types for `ventaro-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{booking::BookingStatus, purchase::PurchaseStatus};

#[derive(Debug, Error)]
pub enum Error {
  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("product not found: {0}")]
  ProductNotFound(String),

  #[error("purchase not found: {0}")]
  PurchaseNotFound(Uuid),

  #[error("booking not found: {0}")]
  BookingNotFound(Uuid),

  #[error("cannot move purchase from {from} to {to}")]
  InvalidPurchaseTransition {
    from: PurchaseStatus,
    to:   PurchaseStatus,
  },

  #[error("cannot move booking from {from} to {to}")]
  InvalidBookingTransition {
    from: BookingStatus,
    to:   BookingStatus,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
