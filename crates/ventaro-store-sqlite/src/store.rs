//! [`SqliteStore`]: the SQLite implementation of [`Storefront`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use ventaro_core::{
  audit::{EmailLog, NewEmailLog, NewSystemLog, SystemLog},
  booking::{BookingStatus, CoachingBooking, NewBooking},
  normalize_email,
  product::{NewProduct, Product, ProductUpdate},
  profile::{NewProfile, Profile},
  purchase::{
    CompletedSession, NewPurchase, Purchase, PurchaseFilter, PurchaseStatus,
    SessionOutcome,
  },
  store::{DashboardStats, Revenue, Storefront},
};

use crate::{
  encode::{
    decode_enum, encode_dt, encode_uuid, RawBooking, RawEmailLog, RawProduct,
    RawProfile, RawPurchase, RawSystemLog, BOOKING_COLUMNS, EMAIL_LOG_COLUMNS,
    PRODUCT_COLUMNS, PROFILE_COLUMNS, PURCHASE_COLUMNS, SYSTEM_LOG_COLUMNS,
  },
  error::is_constraint_violation,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ventaro storefront backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_profile(&self, column: &'static str, value: String) -> Result<Option<Profile>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE {column} = ?1"),
            rusqlite::params![value],
            RawProfile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn fetch_purchase(&self, column: &'static str, value: String) -> Result<Option<Purchase>> {
    let raw: Option<RawPurchase> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE {column} = ?1"),
            rusqlite::params![value],
            RawPurchase::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPurchase::into_purchase).transpose()
  }

  /// Write every mutable column of `product` back to its row.
  async fn write_product(&self, product: &Product) -> Result<()> {
    let id              = product.id.clone();
    let name            = product.name.clone();
    let description     = product.description.clone();
    let price           = product.price;
    let currency        = product.currency.clone();
    let stripe_price_id = product.stripe_price_id.clone();
    let category        = product.category.as_ref().to_owned();
    let is_active       = product.is_active;
    let download_file   = product.download_file.clone();
    let updated_at      = encode_dt(product.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE products SET
             name = ?2, description = ?3, price = ?4, currency = ?5,
             stripe_price_id = ?6, category = ?7, is_active = ?8,
             download_file = ?9, updated_at = ?10
           WHERE id = ?1",
          rusqlite::params![
            id,
            name,
            description,
            price,
            currency,
            stripe_price_id,
            category,
            is_active,
            download_file,
            updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Storefront impl ─────────────────────────────────────────────────────────

impl Storefront for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      id:            Uuid::new_v4(),
      email:         normalize_email(&input.email),
      name:          input.name.trim().to_owned(),
      password_hash: input.password_hash,
      role:          input.role,
      created_at:    Utc::now(),
      last_login_at: None,
    };

    let id_str   = encode_uuid(profile.id);
    let email    = profile.email.clone();
    let name     = profile.name.clone();
    let hash     = profile.password_hash.clone();
    let role_str = profile.role.as_ref().to_owned();
    let at_str   = encode_dt(profile.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (id, email, name, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, email, name, hash, role_str, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(profile),
      Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateEmail(profile.email)),
      Err(e) => Err(e.into()),
    }
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self.fetch_profile("id", encode_uuid(id)).await
  }

  async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    self.fetch_profile("email", normalize_email(email)).await
  }

  async fn record_login(&self, id: Uuid) -> Result<Profile> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET last_login_at = ?2 WHERE id = ?1",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(ventaro_core::Error::ProfileNotFound(id).into());
    }
    self
      .get_profile(id)
      .await?
      .ok_or_else(|| ventaro_core::Error::ProfileNotFound(id).into())
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at, email"
        ))?;
        let rows = stmt
          .query_map([], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Products ──────────────────────────────────────────────────────────────

  async fn upsert_product(&self, input: NewProduct) -> Result<Product> {
    let id              = input.id.trim().to_owned();
    let name            = input.name;
    let description     = input.description;
    let price           = input.price;
    let currency        = input.currency.to_lowercase();
    let stripe_price_id = input.stripe_price_id;
    let category        = input.category.as_ref().to_owned();
    let is_active       = input.is_active;
    let download_file   = input.download_file;
    let now             = encode_dt(Utc::now());
    let id_for_insert   = id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (
             id, name, description, price, currency, stripe_price_id,
             category, is_active, download_file, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
           ON CONFLICT(id) DO UPDATE SET
             name            = excluded.name,
             description     = excluded.description,
             price           = excluded.price,
             currency        = excluded.currency,
             stripe_price_id = excluded.stripe_price_id,
             category        = excluded.category,
             is_active       = excluded.is_active,
             download_file   = excluded.download_file,
             updated_at      = excluded.updated_at",
          rusqlite::params![
            id_for_insert,
            name,
            description,
            price,
            currency,
            stripe_price_id,
            category,
            is_active,
            download_file,
            now,
          ],
        )?;
        Ok(())
      })
      .await?;

    self
      .get_product(&id)
      .await?
      .ok_or_else(|| ventaro_core::Error::ProductNotFound(id).into())
  }

  async fn get_product(&self, id: &str) -> Result<Option<Product>> {
    let id = id.to_owned();

    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
            rusqlite::params![id],
            RawProduct::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PRODUCT_COLUMNS} FROM products
           WHERE (?1 = 0 OR is_active = 1)
           ORDER BY price, id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![active_only], RawProduct::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn update_product(&self, id: &str, update: ProductUpdate) -> Result<Option<Product>> {
    let Some(mut product) = self.get_product(id).await? else {
      return Ok(None);
    };

    update.apply(&mut product, Utc::now());
    self.write_product(&product).await?;
    Ok(Some(product))
  }

  // ── Purchases ─────────────────────────────────────────────────────────────

  async fn create_purchase(&self, input: NewPurchase) -> Result<Purchase> {
    let now = Utc::now();
    let purchase = Purchase {
      id:                Uuid::new_v4(),
      user_id:           input.user_id,
      customer_email:    normalize_email(&input.customer_email),
      product_id:        input.product_id,
      product_name:      input.product_name,
      stripe_session_id: input.stripe_session_id,
      amount:            input.amount,
      currency:          input.currency.to_lowercase(),
      status:            PurchaseStatus::Pending,
      created_at:        now,
      updated_at:        now,
    };

    let id_str       = encode_uuid(purchase.id);
    let user_str     = purchase.user_id.map(encode_uuid);
    let email        = purchase.customer_email.clone();
    let product_id   = purchase.product_id.clone();
    let product_name = purchase.product_name.clone();
    let session_id   = purchase.stripe_session_id.clone();
    let amount       = purchase.amount;
    let currency     = purchase.currency.clone();
    let status_str   = purchase.status.as_ref().to_owned();
    let at_str       = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO purchases (
             id, user_id, customer_email, product_id, product_name,
             stripe_session_id, amount, currency, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            user_str,
            email,
            product_id,
            product_name,
            session_id,
            amount,
            currency,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(purchase),
      Err(e) if is_constraint_violation(&e) => {
        Err(Error::DuplicateSession(purchase.stripe_session_id))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn get_purchase(&self, id: Uuid) -> Result<Option<Purchase>> {
    self.fetch_purchase("id", encode_uuid(id)).await
  }

  async fn get_purchase_by_session(&self, stripe_session_id: &str) -> Result<Option<Purchase>> {
    self
      .fetch_purchase("stripe_session_id", stripe_session_id.to_owned())
      .await
  }

  async fn list_purchases(&self, filter: &PurchaseFilter) -> Result<Vec<Purchase>> {
    let user_str   = filter.owner.as_ref().map(|o| encode_uuid(o.user_id));
    let email      = filter
      .owner
      .as_ref()
      .and_then(|o| o.email.as_deref())
      .map(normalize_email);
    let status_str = filter.status.map(|s| s.as_ref().to_owned());

    let raws: Vec<RawPurchase> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PURCHASE_COLUMNS} FROM purchases
           WHERE (?1 IS NULL OR user_id = ?1 OR customer_email = ?2)
             AND (?3 IS NULL OR status = ?3)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, email, status_str],
            RawPurchase::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPurchase::into_purchase).collect()
  }

  async fn set_purchase_status(&self, id: Uuid, status: PurchaseStatus) -> Result<Purchase> {
    let current = self
      .get_purchase(id)
      .await?
      .ok_or(ventaro_core::Error::PurchaseNotFound(id))?;

    current.status.check_transition(status)?;
    if current.status == status {
      return Ok(current);
    }

    let id_str   = encode_uuid(id);
    let from_str = current.status.as_ref().to_owned();
    let to_str   = status.as_ref().to_owned();
    let at_str   = encode_dt(Utc::now());

    // Guard on the old status so a concurrent transition is not overwritten.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE purchases SET status = ?3, updated_at = ?4
           WHERE id = ?1 AND status = ?2",
          rusqlite::params![id_str, from_str, to_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .get_purchase(id)
      .await?
      .ok_or_else(|| ventaro_core::Error::PurchaseNotFound(id).into())
  }

  async fn set_purchase_product(&self, id: Uuid, product_id: &str) -> Result<()> {
    let id_str     = encode_uuid(id);
    let product_id = product_id.to_owned();
    let at_str     = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE purchases SET product_id = ?2, updated_at = ?3 WHERE id = ?1",
          rusqlite::params![id_str, product_id, at_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(ventaro_core::Error::PurchaseNotFound(id).into());
    }
    Ok(())
  }

  async fn complete_session(&self, session: CompletedSession) -> Result<SessionOutcome> {
    let new_id     = encode_uuid(Uuid::new_v4());
    let session_id = session.stripe_session_id;
    let user_str   = session.user_id.map(encode_uuid);
    let email      = normalize_email(&session.customer_email);
    let product_id = session.product_id;
    let name       = session.product_name;
    let amount     = session.amount;
    let currency   = session.currency.to_lowercase();
    let completed  = PurchaseStatus::Completed.as_ref().to_owned();
    let at_str     = encode_dt(Utc::now());

    let (raw, newly_completed): (RawPurchase, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT status FROM purchases WHERE stripe_session_id = ?1",
            rusqlite::params![session_id],
            |r| r.get(0),
          )
          .optional()?;

        let newly = match existing.as_deref() {
          Some(s) if s == completed => false,
          Some(_) => {
            tx.execute(
              "UPDATE purchases SET
                 status       = ?2,
                 user_id      = COALESCE(user_id, ?3),
                 product_name = COALESCE(product_name, ?4),
                 amount       = CASE WHEN ?5 > 0 THEN ?5 ELSE amount END,
                 updated_at   = ?6
               WHERE stripe_session_id = ?1",
              rusqlite::params![session_id, completed, user_str, name, amount, at_str],
            )?;
            true
          }
          None => {
            tx.execute(
              "INSERT INTO purchases (
                 id, user_id, customer_email, product_id, product_name,
                 stripe_session_id, amount, currency, status, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
              rusqlite::params![
                new_id, user_str, email, product_id, name, session_id, amount,
                currency, completed, at_str,
              ],
            )?;
            true
          }
        };

        let raw = tx.query_row(
          &format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE stripe_session_id = ?1"),
          rusqlite::params![session_id],
          RawPurchase::from_row,
        )?;
        tx.commit()?;
        Ok((raw, newly))
      })
      .await?;

    Ok(SessionOutcome {
      purchase: raw.into_purchase()?,
      newly_completed,
    })
  }

  async fn has_entitlement(&self, user_id: Uuid, product_id: &str) -> Result<bool> {
    let user_str   = encode_uuid(user_id);
    let product_id = product_id.to_owned();
    let completed  = PurchaseStatus::Completed.as_ref().to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (
             SELECT 1 FROM purchases
             WHERE user_id = ?1 AND product_id = ?2 AND status = ?3
           )",
          rusqlite::params![user_str, product_id, completed],
          |r| r.get::<_, bool>(0),
        )?)
      })
      .await?;
    Ok(found)
  }

  // ── Bookings ──────────────────────────────────────────────────────────────

  async fn create_booking(&self, input: NewBooking) -> Result<CoachingBooking> {
    let now = Utc::now();
    let booking = CoachingBooking {
      id:             Uuid::new_v4(),
      user_id:        input.user_id,
      name:           input.name,
      email:          normalize_email(&input.email),
      preferred_date: input.preferred_date,
      preferred_time: input.preferred_time,
      timezone:       input.timezone,
      message:        input.message,
      status:         BookingStatus::Pending,
      created_at:     now,
      updated_at:     now,
    };

    let id_str     = encode_uuid(booking.id);
    let user_str   = booking.user_id.map(encode_uuid);
    let name       = booking.name.clone();
    let email      = booking.email.clone();
    let date       = booking.preferred_date.clone();
    let time       = booking.preferred_time.clone();
    let timezone   = booking.timezone.clone();
    let message    = booking.message.clone();
    let status_str = booking.status.as_ref().to_owned();
    let at_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO coaching_bookings (
             id, user_id, name, email, preferred_date, preferred_time,
             timezone, message, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str, user_str, name, email, date, time, timezone, message,
            status_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(booking)
  }

  async fn get_booking(&self, id: Uuid) -> Result<Option<CoachingBooking>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBooking> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM coaching_bookings WHERE id = ?1"),
            rusqlite::params![id_str],
            RawBooking::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBooking::into_booking).transpose()
  }

  async fn list_bookings(&self, email: Option<&str>) -> Result<Vec<CoachingBooking>> {
    let email = email.map(normalize_email);

    let raws: Vec<RawBooking> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOKING_COLUMNS} FROM coaching_bookings
           WHERE (?1 IS NULL OR email = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![email], RawBooking::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBooking::into_booking).collect()
  }

  async fn set_booking_status(&self, id: Uuid, status: BookingStatus) -> Result<CoachingBooking> {
    let current = self
      .get_booking(id)
      .await?
      .ok_or(ventaro_core::Error::BookingNotFound(id))?;

    current.status.check_transition(status)?;

    let id_str   = encode_uuid(id);
    let from_str = current.status.as_ref().to_owned();
    let to_str   = status.as_ref().to_owned();
    let at_str   = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE coaching_bookings SET status = ?3, updated_at = ?4
           WHERE id = ?1 AND status = ?2",
          rusqlite::params![id_str, from_str, to_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .get_booking(id)
      .await?
      .ok_or_else(|| ventaro_core::Error::BookingNotFound(id).into())
  }

  // ── Audit logs ───────────────────────────────────────────────────────────

  async fn append_email_log(&self, input: NewEmailLog) -> Result<EmailLog> {
    let log = EmailLog {
      id:         Uuid::new_v4(),
      recipient:  input.recipient,
      subject:    input.subject,
      kind:       input.kind,
      status:     input.status,
      error:      input.error,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(log.id);
    let recipient  = log.recipient.clone();
    let subject    = log.subject.clone();
    let kind       = log.kind.clone();
    let status_str = log.status.as_ref().to_owned();
    let error      = log.error.clone();
    let at_str     = encode_dt(log.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO email_logs (id, recipient, subject, kind, status, error, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, recipient, subject, kind, status_str, error, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(log)
  }

  async fn list_email_logs(&self, limit: usize) -> Result<Vec<EmailLog>> {
    let limit_val = limit as i64;

    let raws: Vec<RawEmailLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMAIL_LOG_COLUMNS} FROM email_logs
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawEmailLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmailLog::into_log).collect()
  }

  async fn append_system_log(&self, input: NewSystemLog) -> Result<SystemLog> {
    let log = SystemLog {
      id:         Uuid::new_v4(),
      level:      input.level,
      source:     input.source,
      message:    input.message,
      details:    input.details,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(log.id);
    let level_str = log.level.as_ref().to_owned();
    let source    = log.source.clone();
    let message   = log.message.clone();
    let details   = serde_json::to_string(&log.details)?;
    let at_str    = encode_dt(log.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO system_logs (id, level, source, message, details, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, level_str, source, message, details, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(log)
  }

  async fn list_system_logs(&self, limit: usize) -> Result<Vec<SystemLog>> {
    let limit_val = limit as i64;

    let raws: Vec<RawSystemLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SYSTEM_LOG_COLUMNS} FROM system_logs
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawSystemLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSystemLog::into_log).collect()
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  async fn dashboard_stats(&self) -> Result<DashboardStats> {
    type Counts = Vec<(String, i64)>;

    let (profiles, active_products, purchases, revenue, bookings): (i64, i64, Counts, Counts, Counts) =
      self
        .conn
        .call(|conn| {
          let count = |sql: &str| conn.query_row(sql, [], |r| r.get::<_, i64>(0));
          let grouped = |sql: &str| -> rusqlite::Result<Counts> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
              .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
          };

          Ok((
            count("SELECT COUNT(*) FROM profiles")?,
            count("SELECT COUNT(*) FROM products WHERE is_active = 1")?,
            grouped("SELECT status, COUNT(*) FROM purchases GROUP BY status")?,
            grouped(
              "SELECT currency, COALESCE(SUM(amount), 0) FROM purchases
               WHERE status = 'completed'
               GROUP BY currency ORDER BY currency",
            )?,
            grouped("SELECT status, COUNT(*) FROM coaching_bookings GROUP BY status")?,
          ))
        })
        .await?;

    let mut stats = DashboardStats {
      profiles:        profiles as u64,
      active_products: active_products as u64,
      revenue:         revenue
        .into_iter()
        .map(|(currency, amount)| Revenue { currency, amount })
        .collect(),
      ..Default::default()
    };

    stats.purchases_by_status = PurchaseStatus::iter().map(|s| (s, 0)).collect();
    for (status, n) in purchases {
      stats
        .purchases_by_status
        .insert(decode_enum("status", &status)?, n as u64);
    }

    stats.bookings_by_status = BookingStatus::iter().map(|s| (s, 0)).collect();
    for (status, n) in bookings {
      stats
        .bookings_by_status
        .insert(decode_enum("status", &status)?, n as u64);
    }

    Ok(stats)
  }
}
