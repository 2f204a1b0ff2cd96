//! `Stripe-Signature` header verification.
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>`. Each `v1` is an
//! HMAC-SHA256 of `"{t}.{payload}"` keyed with the endpoint secret; more than
//! one appears while a secret is being rolled.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Result, StripeError};

type HmacSha256 = Hmac<Sha256>;

/// Stripe's own default: five minutes.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Verify `header` against `payload`, accepting signatures no older than
/// `tolerance_secs` relative to `now` (unix seconds).
pub fn verify_signature(
  payload: &[u8],
  header: &str,
  secret: &str,
  tolerance_secs: i64,
  now: i64,
) -> Result<()> {
  let mut timestamp = None;
  let mut signatures = Vec::new();

  for part in header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", t)) => {
        timestamp = Some(
          t.parse::<i64>()
            .map_err(|_| StripeError::InvalidSignature("malformed timestamp"))?,
        );
      }
      // Undecodable entries are skipped, not fatal.
      Some(("v1", sig)) => signatures.extend(hex::decode(sig).ok()),
      _ => {}
    }
  }

  let timestamp = timestamp.ok_or(StripeError::InvalidSignature("missing timestamp"))?;
  if signatures.is_empty() {
    return Err(StripeError::InvalidSignature("no v1 signature"));
  }
  if now - timestamp > tolerance_secs {
    return Err(StripeError::InvalidSignature("timestamp outside tolerance"));
  }

  let mac = signed_payload_mac(payload, secret, timestamp)?;
  // `verify_slice` compares in constant time.
  if signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok()) {
    Ok(())
  } else {
    Err(StripeError::InvalidSignature("no matching signature"))
  }
}

/// Produce a header value for `payload`, as Stripe would send it.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let mac = signed_payload_mac(payload, secret, timestamp)?;
  Ok(format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes())))
}

fn signed_payload_mac(payload: &[u8], secret: &str, timestamp: i64) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|_| StripeError::InvalidSignature("unusable signing secret"))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "whsec_test_secret";
  const NOW: i64 = 1_760_000_000;
  const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

  #[test]
  fn accepts_correct_signature() {
    let header = sign(BODY, SECRET, NOW).unwrap();
    assert!(verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW + 10).is_ok());
  }

  #[test]
  fn rejects_tampered_payload() {
    let header = sign(BODY, SECRET, NOW).unwrap();
    let tampered = br#"{"id":"evt_2","type":"checkout.session.completed"}"#;
    assert!(verify_signature(tampered, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_err());
  }

  #[test]
  fn rejects_wrong_secret() {
    let header = sign(BODY, "whsec_other", NOW).unwrap();
    assert!(verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_err());
  }

  #[test]
  fn rejects_stale_timestamp() {
    let header = sign(BODY, SECRET, NOW).unwrap();
    let err = verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW + 301)
      .unwrap_err();
    assert!(matches!(err, StripeError::InvalidSignature("timestamp outside tolerance")));
  }

  #[test]
  fn any_matching_v1_is_enough() {
    let good = sign(BODY, SECRET, NOW).unwrap();
    let good_sig = good.split_once(",v1=").unwrap().1;
    let header = format!("t={NOW},v1={},v1={good_sig}", "00".repeat(32));
    assert!(verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_ok());
  }

  #[test]
  fn rejects_malformed_headers() {
    let bare = format!("t={NOW}");
    for header in ["", "v1=abcd", "t=notanumber,v1=abcd", bare.as_str()] {
      assert!(
        verify_signature(BODY, header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_err(),
        "{header:?}"
      );
    }
  }
}
