//! Integration tests for `SqliteStore` against an in-memory database.

use serde_json::json;
use uuid::Uuid;
use ventaro_core::{
  audit::{EmailStatus, LogLevel, NewEmailLog, NewSystemLog},
  booking::{BookingStatus, NewBooking},
  catalog::{self, default_products},
  product::{ProductCategory, ProductUpdate},
  profile::{NewProfile, Role},
  purchase::{CompletedSession, NewPurchase, Owner, PurchaseFilter, PurchaseStatus},
  store::Storefront,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_profile(email: &str) -> NewProfile {
  NewProfile {
    email:         email.to_owned(),
    name:          "Ada Buyer".to_owned(),
    password_hash: "$argon2id$fake".to_owned(),
    role:          Role::User,
  }
}

fn new_purchase(session: &str, email: &str, user_id: Option<Uuid>) -> NewPurchase {
  NewPurchase {
    user_id,
    customer_email: email.to_owned(),
    product_id: "ai-prompts-arsenal-2025".to_owned(),
    product_name: Some("AI Prompts Arsenal 2025".to_owned()),
    stripe_session_id: session.to_owned(),
    amount: 1000,
    currency: "USD".to_owned(),
  }
}

fn completed_session(session: &str, email: &str) -> CompletedSession {
  CompletedSession {
    stripe_session_id: session.to_owned(),
    user_id:           None,
    customer_email:    email.to_owned(),
    product_id:        "ai-tools-mastery-guide-2025".to_owned(),
    product_name:      Some("AI Tools Mastery Guide 2025".to_owned()),
    amount:            2500,
    currency:          "usd".to_owned(),
  }
}

fn new_booking(email: &str) -> NewBooking {
  NewBooking {
    user_id:        None,
    name:           "Grace".to_owned(),
    email:          email.to_owned(),
    preferred_date: "2026-11-02".to_owned(),
    preferred_time: "14:00".to_owned(),
    timezone:       "Europe/London".to_owned(),
    message:        Some("Looking to automate support".to_owned()),
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_lookup_profile_case_insensitively() {
  let s = store().await;

  let profile = s.create_profile(new_profile("  Ada@Example.com ")).await.unwrap();
  assert_eq!(profile.email, "ada@example.com");
  assert_eq!(profile.role, Role::User);
  assert!(profile.last_login_at.is_none());

  let fetched = s.get_profile_by_email("ADA@example.COM").await.unwrap().unwrap();
  assert_eq!(fetched.id, profile.id);
  assert_eq!(fetched.password_hash, "$argon2id$fake");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_profile(new_profile("ada@example.com")).await.unwrap();

  let err = s.create_profile(new_profile("ADA@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateEmail(ref e) if e == "ada@example.com"));
}

#[tokio::test]
async fn record_login_stamps_time() {
  let s = store().await;
  let profile = s.create_profile(new_profile("ada@example.com")).await.unwrap();

  let updated = s.record_login(profile.id).await.unwrap();
  assert!(updated.last_login_at.is_some());

  let err = s.record_login(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(ventaro_core::Error::ProfileNotFound(_))));
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seeding_twice_keeps_one_row_per_code() {
  let s = store().await;
  for p in default_products() {
    s.upsert_product(p).await.unwrap();
  }
  for p in default_products() {
    s.upsert_product(p).await.unwrap();
  }

  let all = s.list_products(false).await.unwrap();
  assert_eq!(all.len(), 5);
  // Cheapest first.
  assert_eq!(all[0].id, "ai-prompts-arsenal-2025");
}

#[tokio::test]
async fn inactive_products_hidden_from_active_listing() {
  let s = store().await;
  for p in default_products() {
    s.upsert_product(p).await.unwrap();
  }

  let update = ProductUpdate { is_active: Some(false), ..Default::default() };
  let updated = s
    .update_product("support-package", update)
    .await
    .unwrap()
    .unwrap();
  assert!(!updated.is_active);

  let active = s.list_products(true).await.unwrap();
  assert_eq!(active.len(), 4);
  assert!(active.iter().all(|p| p.id != "support-package"));

  let fetched = s.get_product("support-package").await.unwrap().unwrap();
  assert!(!fetched.is_active);
  assert_eq!(fetched.category, ProductCategory::Support);
}

#[tokio::test]
async fn update_missing_product_returns_none() {
  let s = store().await;
  let result = s
    .update_product("nope", ProductUpdate::default())
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Purchases ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_purchase_is_pending_and_lowercases_currency() {
  let s = store().await;
  let p = s
    .create_purchase(new_purchase("cs_1", "Buyer@Example.com", None))
    .await
    .unwrap();
  assert_eq!(p.status, PurchaseStatus::Pending);
  assert_eq!(p.currency, "usd");
  assert_eq!(p.customer_email, "buyer@example.com");

  let by_session = s.get_purchase_by_session("cs_1").await.unwrap().unwrap();
  assert_eq!(by_session.id, p.id);
}

#[tokio::test]
async fn duplicate_session_is_rejected() {
  let s = store().await;
  s.create_purchase(new_purchase("cs_1", "a@example.com", None)).await.unwrap();
  let err = s
    .create_purchase(new_purchase("cs_1", "b@example.com", None))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateSession(ref id) if id == "cs_1"));
}

#[tokio::test]
async fn complete_session_is_idempotent() {
  let s = store().await;

  let first = s
    .complete_session(completed_session("cs_new", "buyer@example.com"))
    .await
    .unwrap();
  assert!(first.newly_completed);
  assert_eq!(first.purchase.status, PurchaseStatus::Completed);

  let second = s
    .complete_session(completed_session("cs_new", "buyer@example.com"))
    .await
    .unwrap();
  assert!(!second.newly_completed);
  assert_eq!(second.purchase.id, first.purchase.id);

  let all = s.list_purchases(&PurchaseFilter::default()).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn complete_session_upgrades_pending_row() {
  let s = store().await;
  let profile = s.create_profile(new_profile("buyer@example.com")).await.unwrap();
  let pending = s
    .create_purchase(new_purchase("cs_1", "buyer@example.com", Some(profile.id)))
    .await
    .unwrap();

  let outcome = s
    .complete_session(completed_session("cs_1", "buyer@example.com"))
    .await
    .unwrap();
  assert!(outcome.newly_completed);
  assert_eq!(outcome.purchase.id, pending.id);
  assert_eq!(outcome.purchase.user_id, Some(profile.id));
  // The product chosen at checkout wins over whatever Stripe reports.
  assert_eq!(outcome.purchase.product_id, "ai-prompts-arsenal-2025");
}

#[tokio::test]
async fn failed_purchase_completes_on_late_settlement() {
  let s = store().await;
  let p = s.create_purchase(new_purchase("cs_1", "a@example.com", None)).await.unwrap();
  s.set_purchase_status(p.id, PurchaseStatus::Failed).await.unwrap();

  let outcome = s
    .complete_session(completed_session("cs_1", "a@example.com"))
    .await
    .unwrap();
  assert!(outcome.newly_completed);
  assert_eq!(outcome.purchase.status, PurchaseStatus::Completed);
}

#[tokio::test]
async fn completed_purchase_cannot_fail() {
  let s = store().await;
  let p = s.create_purchase(new_purchase("cs_1", "a@example.com", None)).await.unwrap();
  s.set_purchase_status(p.id, PurchaseStatus::Completed).await.unwrap();

  let err = s
    .set_purchase_status(p.id, PurchaseStatus::Failed)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ventaro_core::Error::InvalidPurchaseTransition { .. })
  ));

  // Same status again is a no-op.
  let again = s
    .set_purchase_status(p.id, PurchaseStatus::Completed)
    .await
    .unwrap();
  assert_eq!(again.status, PurchaseStatus::Completed);
}

#[tokio::test]
async fn list_purchases_filters_by_owner_and_status() {
  let s = store().await;
  let profile = s.create_profile(new_profile("ada@example.com")).await.unwrap();

  s.create_purchase(new_purchase("cs_1", "ada@example.com", Some(profile.id)))
    .await
    .unwrap();
  // Inserted from a webhook: no user id, matched by email.
  s.complete_session(completed_session("cs_2", "ada@example.com"))
    .await
    .unwrap();
  s.create_purchase(new_purchase("cs_3", "other@example.com", None))
    .await
    .unwrap();

  let linked = s
    .list_purchases(&PurchaseFilter {
      owner:  Some(Owner { user_id: profile.id, email: None }),
      status: None,
    })
    .await
    .unwrap();
  assert_eq!(linked.len(), 1);
  assert_eq!(linked[0].stripe_session_id, "cs_1");

  let owner = Owner { user_id: profile.id, email: Some("ADA@example.com".to_owned()) };
  let mine = s
    .list_purchases(&PurchaseFilter { owner: Some(owner.clone()), status: None })
    .await
    .unwrap();
  assert_eq!(mine.len(), 2);
  // Newest first.
  assert_eq!(mine[0].stripe_session_id, "cs_2");

  let completed = s
    .list_purchases(&PurchaseFilter {
      owner:  Some(owner),
      status: Some(PurchaseStatus::Completed),
    })
    .await
    .unwrap();
  assert_eq!(completed.len(), 1);

  let all = s.list_purchases(&PurchaseFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn entitlement_requires_completed_purchase() {
  let s = store().await;
  let profile = s.create_profile(new_profile("ada@example.com")).await.unwrap();
  let p = s
    .create_purchase(new_purchase("cs_1", "ada@example.com", Some(profile.id)))
    .await
    .unwrap();

  let code = "ai-prompts-arsenal-2025";
  assert!(!s.has_entitlement(profile.id, code).await.unwrap());

  s.set_purchase_status(p.id, PurchaseStatus::Completed).await.unwrap();
  assert!(s.has_entitlement(profile.id, code).await.unwrap());
  assert!(!s.has_entitlement(profile.id, "support-package").await.unwrap());
}

#[tokio::test]
async fn unlinked_purchase_grants_no_entitlement() {
  let s = store().await;
  s.complete_session(completed_session("cs_1", "Ada@Example.com"))
    .await
    .unwrap();
  let profile = s.create_profile(new_profile("ada@example.com")).await.unwrap();

  let entitled = s
    .has_entitlement(profile.id, "ai-tools-mastery-guide-2025")
    .await
    .unwrap();
  assert!(!entitled);
}

#[tokio::test]
async fn set_purchase_product_rewrites_code() {
  let s = store().await;
  let p = s.create_purchase(new_purchase("cs_1", "a@example.com", None)).await.unwrap();

  s.set_purchase_product(p.id, "support-package").await.unwrap();
  let fetched = s.get_purchase(p.id).await.unwrap().unwrap();
  assert_eq!(fetched.product_id, "support-package");

  let err = s
    .set_purchase_product(Uuid::new_v4(), "support-package")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ventaro_core::Error::PurchaseNotFound(_))));
}

#[tokio::test]
async fn reconcile_repairs_stored_codes() {
  let s = store().await;
  let mut wrong = new_purchase("cs_1", "a@example.com", None);
  wrong.product_id = "ai-tools-mastery-guide-2025".to_owned();
  let wrong = s.create_purchase(wrong).await.unwrap();
  let right = s.create_purchase(new_purchase("cs_2", "b@example.com", None)).await.unwrap();

  let report = catalog::reconcile(&s).await.unwrap();
  assert_eq!(report.examined, 2);
  assert_eq!(report.fixes.len(), 1);
  assert_eq!(report.fixes[0].purchase_id, wrong.id);

  let fixed = s.get_purchase(wrong.id).await.unwrap().unwrap();
  assert_eq!(fixed.product_id, "ai-prompts-arsenal-2025");
  let untouched = s.get_purchase(right.id).await.unwrap().unwrap();
  assert_eq!(untouched.updated_at, right.updated_at);

  let again = catalog::reconcile(&s).await.unwrap();
  assert!(again.fixes.is_empty());
}

// ─── Bookings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_lifecycle() {
  let s = store().await;
  let b = s.create_booking(new_booking("Grace@Example.com")).await.unwrap();
  assert_eq!(b.status, BookingStatus::Pending);
  assert_eq!(b.email, "grace@example.com");

  let confirmed = s.set_booking_status(b.id, BookingStatus::Confirmed).await.unwrap();
  assert_eq!(confirmed.status, BookingStatus::Confirmed);

  let done = s.set_booking_status(b.id, BookingStatus::Completed).await.unwrap();
  assert_eq!(done.status, BookingStatus::Completed);

  let err = s
    .set_booking_status(b.id, BookingStatus::Cancelled)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ventaro_core::Error::InvalidBookingTransition { .. })
  ));
}

#[tokio::test]
async fn missing_booking_status_change_is_not_found() {
  let s = store().await;
  let err = s
    .set_booking_status(Uuid::new_v4(), BookingStatus::Confirmed)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(ventaro_core::Error::BookingNotFound(_))));
}

#[tokio::test]
async fn list_bookings_by_email() {
  let s = store().await;
  s.create_booking(new_booking("grace@example.com")).await.unwrap();
  s.create_booking(new_booking("alan@example.com")).await.unwrap();
  s.create_booking(new_booking("grace@example.com")).await.unwrap();

  assert_eq!(s.list_bookings(None).await.unwrap().len(), 3);
  assert_eq!(
    s.list_bookings(Some("GRACE@example.com")).await.unwrap().len(),
    2
  );
}

// ─── Audit logs ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn email_logs_newest_first_with_limit() {
  let s = store().await;
  for i in 0..3 {
    s.append_email_log(NewEmailLog {
      recipient: format!("user{i}@example.com"),
      subject:   "Your purchase".to_owned(),
      kind:      "purchase_confirmation".to_owned(),
      status:    EmailStatus::Sent,
      error:     None,
    })
    .await
    .unwrap();
  }

  let logs = s.list_email_logs(2).await.unwrap();
  assert_eq!(logs.len(), 2);
  assert_eq!(logs[0].recipient, "user2@example.com");
}

#[tokio::test]
async fn system_log_round_trips_details() {
  let s = store().await;
  s.append_system_log(NewSystemLog::warn(
    "stripe_webhook",
    "unhandled event",
    json!({ "type": "invoice.paid" }),
  ))
  .await
  .unwrap();

  let logs = s.list_system_logs(10).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].level, LogLevel::Warn);
  assert_eq!(logs[0].details["type"], "invoice.paid");
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_counts_and_revenue() {
  let s = store().await;
  for p in default_products() {
    s.upsert_product(p).await.unwrap();
  }
  s.create_profile(new_profile("ada@example.com")).await.unwrap();
  s.create_purchase(new_purchase("cs_1", "a@example.com", None)).await.unwrap();
  s.complete_session(completed_session("cs_2", "a@example.com")).await.unwrap();
  s.complete_session(completed_session("cs_3", "b@example.com")).await.unwrap();
  s.create_booking(new_booking("grace@example.com")).await.unwrap();

  let stats = s.dashboard_stats().await.unwrap();
  assert_eq!(stats.profiles, 1);
  assert_eq!(stats.active_products, 5);
  assert_eq!(stats.purchases_by_status[&PurchaseStatus::Pending], 1);
  assert_eq!(stats.purchases_by_status[&PurchaseStatus::Completed], 2);
  assert_eq!(stats.purchases_by_status[&PurchaseStatus::Failed], 0);
  assert_eq!(stats.bookings_by_status[&BookingStatus::Pending], 1);
  assert_eq!(stats.revenue.len(), 1);
  assert_eq!(stats.revenue[0].currency, "usd");
  assert_eq!(stats.revenue[0].amount, 5000);
}
