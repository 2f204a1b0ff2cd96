//! The `Storefront` trait and supporting read-model types.
//!
//! The trait is implemented by storage backends (e.g. `ventaro-store-sqlite`).
//! The API and the server binary depend on this abstraction, not on any
//! concrete backend.

use std::{collections::BTreeMap, future::Future};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  audit::{EmailLog, NewEmailLog, NewSystemLog, SystemLog},
  booking::{BookingStatus, CoachingBooking, NewBooking},
  product::{NewProduct, Product, ProductUpdate},
  profile::{NewProfile, Profile},
  purchase::{
    CompletedSession, NewPurchase, Purchase, PurchaseFilter, PurchaseStatus,
    SessionOutcome,
  },
};

// ─── Read models ─────────────────────────────────────────────────────────────

/// Completed revenue in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revenue {
  pub currency: String,
  pub amount:   i64,
}

/// Aggregates shown on the admin dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
  pub profiles:             u64,
  pub active_products:      u64,
  pub purchases_by_status:  BTreeMap<PurchaseStatus, u64>,
  pub revenue:              Vec<Revenue>,
  pub bookings_by_status:   BTreeMap<BookingStatus, u64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Ventaro storefront backend.
///
/// Email and system logs are append-only. Purchases and bookings only change
/// through the status operations, which enforce the transition rules in
/// [`PurchaseStatus`] and [`BookingStatus`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait Storefront: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Persist a new profile. The email is normalised before storing; a
  /// duplicate email is an error.
  fn create_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup.
  fn get_profile_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Stamp `last_login_at` with the current time.
  fn record_login(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn list_profiles(
    &self,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  // ── Products ──────────────────────────────────────────────────────────

  /// Insert a product, or overwrite every field of an existing one with the
  /// same code (keeping its `created_at`).
  fn upsert_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  fn get_product<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + 'a;

  fn list_products(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  /// Apply a partial update. Returns `None` if the product does not exist.
  fn update_product<'a>(
    &'a self,
    id: &'a str,
    update: ProductUpdate,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + 'a;

  // ── Purchases ─────────────────────────────────────────────────────────

  /// Record a `Pending` purchase for a freshly created checkout session.
  fn create_purchase(
    &self,
    input: NewPurchase,
  ) -> impl Future<Output = Result<Purchase, Self::Error>> + Send + '_;

  fn get_purchase(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Purchase>, Self::Error>> + Send + '_;

  fn get_purchase_by_session<'a>(
    &'a self,
    stripe_session_id: &'a str,
  ) -> impl Future<Output = Result<Option<Purchase>, Self::Error>> + Send + 'a;

  /// Newest first.
  fn list_purchases<'a>(
    &'a self,
    filter: &'a PurchaseFilter,
  ) -> impl Future<Output = Result<Vec<Purchase>, Self::Error>> + Send + 'a;

  /// Move a purchase to `status`, enforcing the transition rules.
  fn set_purchase_status(
    &self,
    id: Uuid,
    status: PurchaseStatus,
  ) -> impl Future<Output = Result<Purchase, Self::Error>> + Send + '_;

  /// Rewrite the internal product code of a purchase (reconciliation).
  fn set_purchase_product<'a>(
    &'a self,
    id: Uuid,
    product_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Mark the purchase for `session` completed, inserting it if this server
  /// has never seen the session. At most one purchase row ever exists per
  /// session id.
  fn complete_session(
    &self,
    session: CompletedSession,
  ) -> impl Future<Output = Result<SessionOutcome, Self::Error>> + Send + '_;

  /// Whether the profile holds a completed purchase of `product_id`. Only
  /// purchases linked to the profile id count; a matching email does not.
  fn has_entitlement<'a>(
    &'a self,
    user_id: Uuid,
    product_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Bookings ──────────────────────────────────────────────────────────

  fn create_booking(
    &self,
    input: NewBooking,
  ) -> impl Future<Output = Result<CoachingBooking, Self::Error>> + Send + '_;

  fn get_booking(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CoachingBooking>, Self::Error>> + Send + '_;

  /// Newest first; restricted to one email when given.
  fn list_bookings<'a>(
    &'a self,
    email: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<CoachingBooking>, Self::Error>> + Send + 'a;

  /// Move a booking to `status`, enforcing the transition rules.
  fn set_booking_status(
    &self,
    id: Uuid,
    status: BookingStatus,
  ) -> impl Future<Output = Result<CoachingBooking, Self::Error>> + Send + '_;

  // ── Audit logs ───────────────────────────────────────────────────────

  fn append_email_log(
    &self,
    input: NewEmailLog,
  ) -> impl Future<Output = Result<EmailLog, Self::Error>> + Send + '_;

  /// Newest first, at most `limit` rows.
  fn list_email_logs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<EmailLog>, Self::Error>> + Send + '_;

  fn append_system_log(
    &self,
    input: NewSystemLog,
  ) -> impl Future<Output = Result<SystemLog, Self::Error>> + Send + '_;

  /// Newest first, at most `limit` rows.
  fn list_system_logs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<SystemLog>, Self::Error>> + Send + '_;

  // ── Dashboard ─────────────────────────────────────────────────────────

  fn dashboard_stats(
    &self,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + '_;
}
