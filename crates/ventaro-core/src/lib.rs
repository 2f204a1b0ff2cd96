//! Core types and trait definitions for the Ventaro storefront.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, the payment and mail adapters, and the API all depend on
//! it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod booking;
pub mod catalog;
pub mod error;
pub mod product;
pub mod profile;
pub mod purchase;
pub mod store;

pub use error::{Error, Result};

/// Normalise an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// A very small plausibility check: one `@`, non-empty local part, and a dot
/// somewhere in the domain.
pub fn is_plausible_email(email: &str) -> bool {
  let email = email.trim();
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
    }
    None => false,
  }
}
