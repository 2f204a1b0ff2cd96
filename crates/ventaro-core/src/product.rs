//! Products sold by the storefront.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five product families the storefront sells.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductCategory {
  Ebook,
  PromptPack,
  Coaching,
  WebBuilder,
  Support,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  /// Internal product code, e.g. `ai-prompts-arsenal-2025`.
  pub id:              String,
  pub name:            String,
  pub description:     String,
  /// Price in minor currency units (cents).
  pub price:           i64,
  /// Lowercase ISO 4217 code, as Stripe reports it.
  pub currency:        String,
  pub stripe_price_id: Option<String>,
  pub category:        ProductCategory,
  pub is_active:       bool,
  /// File name under the configured downloads directory, for digital goods.
  pub download_file:   Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Input to [`crate::store::Storefront::upsert_product`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub id:              String,
  pub name:            String,
  #[serde(default)]
  pub description:     String,
  pub price:           i64,
  #[serde(default = "default_currency")]
  pub currency:        String,
  pub stripe_price_id: Option<String>,
  pub category:        ProductCategory,
  #[serde(default = "default_active")]
  pub is_active:       bool,
  pub download_file:   Option<String>,
}

fn default_currency() -> String { "usd".to_owned() }

fn default_active() -> bool { true }

/// A partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
  pub name:            Option<String>,
  pub description:     Option<String>,
  pub price:           Option<i64>,
  pub currency:        Option<String>,
  pub stripe_price_id: Option<String>,
  pub category:        Option<ProductCategory>,
  pub is_active:       Option<bool>,
  pub download_file:   Option<String>,
}

impl ProductUpdate {
  /// Apply this update to `product` in place, bumping `updated_at`.
  pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
    if let Some(v) = self.name {
      product.name = v;
    }
    if let Some(v) = self.description {
      product.description = v;
    }
    if let Some(v) = self.price {
      product.price = v;
    }
    if let Some(v) = self.currency {
      product.currency = v.to_lowercase();
    }
    if let Some(v) = self.stripe_price_id {
      product.stripe_price_id = Some(v);
    }
    if let Some(v) = self.category {
      product.category = v;
    }
    if let Some(v) = self.is_active {
      product.is_active = v;
    }
    if let Some(v) = self.download_file {
      product.download_file = Some(v);
    }
    product.updated_at = now;
  }
}
