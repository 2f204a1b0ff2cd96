//! The hardcoded product catalog and the Stripe product-name mapping.
//!
//! Stripe reports the product *name* on a completed checkout, not our internal
//! product code. [`map_stripe_product_to_internal`] recovers the code with a
//! case-insensitive keyword match, and [`plan_reconciliation`] re-runs that
//! match over stored purchases to find rows whose `product_id` disagrees.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  product::{NewProduct, ProductCategory},
  purchase::{Purchase, PurchaseFilter},
  store::Storefront,
};

// ─── Categories ──────────────────────────────────────────────────────────────

/// One entry of the mapping table.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
  pub category:      ProductCategory,
  /// Lowercase substrings; any match selects this rule.
  pub keywords:      &'static [&'static str],
  pub internal_code: &'static str,
}

/// Checked in order; the first rule with a matching keyword wins. "AI Prompts
/// Mastery Guide" is therefore a prompt pack, not an e-book.
pub const CATEGORY_RULES: [CategoryRule; 5] = [
  CategoryRule {
    category:      ProductCategory::PromptPack,
    keywords:      &["prompt"],
    internal_code: "ai-prompts-arsenal-2025",
  },
  CategoryRule {
    category:      ProductCategory::Ebook,
    keywords:      &["mastery", "e-book", "ebook", "guide"],
    internal_code: "ai-tools-mastery-guide-2025",
  },
  CategoryRule {
    category:      ProductCategory::Coaching,
    keywords:      &["coaching", "consultation", "strategy session"],
    internal_code: "ai-business-strategy-session-2025",
  },
  CategoryRule {
    category:      ProductCategory::WebBuilder,
    keywords:      &["web", "builder", "website"],
    internal_code: "ai-web-creation-masterclass",
  },
  CategoryRule {
    category:      ProductCategory::Support,
    keywords:      &["support"],
    internal_code: "support-package",
  },
];

/// Map a Stripe product name onto an internal product code.
///
/// Returns `None` for blank names and names that match no category.
pub fn map_stripe_product_to_internal(name: &str) -> Option<&'static str> {
  rule_for(name).map(|r| r.internal_code)
}

/// The category a Stripe product name falls into, if any.
pub fn category_for(name: &str) -> Option<ProductCategory> {
  rule_for(name).map(|r| r.category)
}

fn rule_for(name: &str) -> Option<&'static CategoryRule> {
  let lowered = name.trim().to_lowercase();
  if lowered.is_empty() {
    return None;
  }
  CATEGORY_RULES
    .iter()
    .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
}

// ─── Default catalog ─────────────────────────────────────────────────────────

/// The products created by `ventaro seed` on a fresh database.
pub fn default_products() -> Vec<NewProduct> {
  let product = |rule: &CategoryRule, name: &str, description: &str, price: i64, file: Option<&str>| {
    NewProduct {
      id:              rule.internal_code.to_owned(),
      name:            name.to_owned(),
      description:     description.to_owned(),
      price,
      currency:        "usd".to_owned(),
      stripe_price_id: None,
      category:        rule.category,
      is_active:       true,
      download_file:   file.map(str::to_owned),
    }
  };

  let [prompts, ebook, coaching, web, support] = &CATEGORY_RULES;
  vec![
    product(
      prompts,
      "AI Prompts Arsenal 2025",
      "30 battle-tested prompts for content, marketing and automation.",
      1000,
      Some("ai-prompts-arsenal-2025.pdf"),
    ),
    product(
      ebook,
      "AI Tools Mastery Guide 2025",
      "A 30-page e-book covering the AI tools worth paying for.",
      2500,
      Some("ai-tools-mastery-guide-2025.pdf"),
    ),
    product(
      coaching,
      "AI Business Strategy Session",
      "A one-hour 1:1 coaching session on applying AI to your business.",
      50000,
      None,
    ),
    product(
      web,
      "AI Web Creation Masterclass",
      "Access to the drag-and-drop website builder add-on.",
      9900,
      None,
    ),
    product(
      support,
      "Priority Support Package",
      "Thirty days of priority email support.",
      4900,
      None,
    ),
  ]
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// A purchase whose stored code disagrees with the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductFix {
  pub purchase_id:  Uuid,
  pub product_name: String,
  pub old_code:     String,
  pub new_code:     String,
}

/// A purchase whose recorded product name maps to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedPurchase {
  pub purchase_id:  Uuid,
  pub product_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
  /// Purchases that carried a product name and were checked.
  pub examined: usize,
  pub fixes:    Vec<ProductFix>,
  pub unmapped: Vec<UnmappedPurchase>,
}

/// Work out which purchases need their `product_id` rewritten.
///
/// Pure: the caller applies `fixes`. Applying them and planning again yields
/// an empty `fixes` list.
pub fn plan_reconciliation<'a>(purchases: impl IntoIterator<Item = &'a Purchase>) -> ReconcileReport {
  let mut report = ReconcileReport::default();

  for purchase in purchases {
    let Some(name) = purchase.product_name.as_deref() else {
      continue;
    };
    report.examined += 1;

    match map_stripe_product_to_internal(name) {
      Some(code) if code != purchase.product_id => report.fixes.push(ProductFix {
        purchase_id:  purchase.id,
        product_name: name.to_owned(),
        old_code:     purchase.product_id.clone(),
        new_code:     code.to_owned(),
      }),
      Some(_) => {}
      None => report.unmapped.push(UnmappedPurchase {
        purchase_id:  purchase.id,
        product_name: name.to_owned(),
      }),
    }
  }

  report
}

/// Plan and apply reconciliation against every purchase in `store`.
pub async fn reconcile<S: Storefront>(store: &S) -> Result<ReconcileReport, S::Error> {
  let purchases = store.list_purchases(&PurchaseFilter::default()).await?;
  let report = plan_reconciliation(&purchases);
  for fix in &report.fixes {
    store.set_purchase_product(fix.purchase_id, &fix.new_code).await?;
  }
  Ok(report)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::purchase::PurchaseStatus;

  #[test]
  fn each_category_maps_to_its_code() {
    assert_eq!(
      map_stripe_product_to_internal("AI Prompts Arsenal 2025"),
      Some("ai-prompts-arsenal-2025")
    );
    assert_eq!(
      map_stripe_product_to_internal("AI Tools Mastery Guide"),
      Some("ai-tools-mastery-guide-2025")
    );
    assert_eq!(
      map_stripe_product_to_internal("1:1 Coaching Call"),
      Some("ai-business-strategy-session-2025")
    );
    assert_eq!(
      map_stripe_product_to_internal("Website Builder Add-on"),
      Some("ai-web-creation-masterclass")
    );
    assert_eq!(
      map_stripe_product_to_internal("Priority Support"),
      Some("support-package")
    );
  }

  #[test]
  fn matching_is_case_insensitive() {
    assert_eq!(
      map_stripe_product_to_internal("  PROMPT PACK  "),
      Some("ai-prompts-arsenal-2025")
    );
    assert_eq!(category_for("eBook bundle"), Some(ProductCategory::Ebook));
  }

  #[test]
  fn earlier_rules_win() {
    // Contains both "prompt" and "guide".
    assert_eq!(
      map_stripe_product_to_internal("Prompt Engineering Guide"),
      Some("ai-prompts-arsenal-2025")
    );
    // Contains both "consultation" and "web".
    assert_eq!(
      category_for("Web consultation"),
      Some(ProductCategory::Coaching)
    );
  }

  #[test]
  fn unmatched_and_blank_names() {
    assert_eq!(map_stripe_product_to_internal(""), None);
    assert_eq!(map_stripe_product_to_internal("   "), None);
    assert_eq!(map_stripe_product_to_internal("Gift card"), None);
  }

  #[test]
  fn default_catalog_codes_round_trip_through_mapping() {
    for product in default_products() {
      assert_eq!(
        map_stripe_product_to_internal(&product.name),
        Some(product.id.as_str()),
        "{}",
        product.name
      );
    }
  }

  fn purchase(code: &str, name: Option<&str>) -> Purchase {
    let now = Utc::now();
    Purchase {
      id:                Uuid::new_v4(),
      user_id:           None,
      customer_email:    "buyer@example.com".into(),
      product_id:        code.into(),
      product_name:      name.map(Into::into),
      stripe_session_id: format!("cs_test_{}", Uuid::new_v4().simple()),
      amount:            1000,
      currency:          "usd".into(),
      status:            PurchaseStatus::Completed,
      created_at:        now,
      updated_at:        now,
    }
  }

  #[test]
  fn reconciliation_finds_mismatches() {
    let wrong = purchase("ai-tools-mastery-guide-2025", Some("AI Prompts Arsenal"));
    let right = purchase("support-package", Some("Support"));
    let nameless = purchase("whatever", None);
    let unknown = purchase("whatever", Some("Gift card"));

    let report = plan_reconciliation([&wrong, &right, &nameless, &unknown]);

    assert_eq!(report.examined, 3);
    assert_eq!(report.fixes.len(), 1);
    assert_eq!(report.fixes[0].purchase_id, wrong.id);
    assert_eq!(report.fixes[0].new_code, "ai-prompts-arsenal-2025");
    assert_eq!(report.unmapped.len(), 1);
    assert_eq!(report.unmapped[0].purchase_id, unknown.id);
  }

  #[test]
  fn reconciliation_is_idempotent() {
    let mut purchases = vec![
      purchase("legacy-code", Some("AI Web Creation Masterclass")),
      purchase("ai-prompts-arsenal-2025", Some("Coaching session")),
    ];

    let first = plan_reconciliation(&purchases);
    assert_eq!(first.fixes.len(), 2);
    for fix in &first.fixes {
      let p = purchases.iter_mut().find(|p| p.id == fix.purchase_id).unwrap();
      p.product_id = fix.new_code.clone();
    }

    let second = plan_reconciliation(&purchases);
    assert!(second.fixes.is_empty());
    assert_eq!(second.examined, 2);
  }
}
