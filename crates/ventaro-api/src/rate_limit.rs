//! Per-process booking rate limiter.
//!
//! Keeps the timestamps of recent attempts per key in a mutex-guarded map.
//! Nothing is persisted: a restart forgets every window.

use std::{
  collections::HashMap,
  sync::Mutex,
  time::{Duration, Instant},
};

pub struct RateLimiter {
  max_attempts: usize,
  window:       Duration,
  attempts:     Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
  pub fn new(max_attempts: usize, window: Duration) -> Self {
    Self { max_attempts, window, attempts: Mutex::new(HashMap::new()) }
  }

  /// Two attempts per rolling 24 hours.
  pub fn bookings() -> Self { Self::new(2, Duration::from_secs(24 * 60 * 60)) }

  /// Record an attempt for `key` at `now`. Returns `false`, recording nothing,
  /// when `key` already used every attempt inside the window.
  pub fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
    let key = key.trim().to_lowercase();
    let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

    let window = self.window;
    map.retain(|_, hits| {
      hits.retain(|t| now.saturating_duration_since(*t) < window);
      !hits.is_empty()
    });

    let hits = map.entry(key).or_default();
    if hits.len() >= self.max_attempts {
      return false;
    }
    hits.push(now);
    true
  }

  pub fn try_acquire(&self, key: &str) -> bool { self.try_acquire_at(key, Instant::now()) }

  /// Give back the most recent attempt for `key`, for requests that failed
  /// after acquiring.
  pub fn release(&self, key: &str) {
    let key = key.trim().to_lowercase();
    let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(hits) = map.get_mut(&key) {
      hits.pop();
      if hits.is_empty() {
        map.remove(&key);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn third_attempt_in_window_is_refused() {
    let limiter = RateLimiter::bookings();
    let t0 = Instant::now();
    assert!(limiter.try_acquire_at("a@example.com", t0));
    assert!(limiter.try_acquire_at("A@Example.com ", t0 + Duration::from_secs(60)));
    assert!(!limiter.try_acquire_at("a@example.com", t0 + Duration::from_secs(120)));
    // Other keys are independent.
    assert!(limiter.try_acquire_at("b@example.com", t0 + Duration::from_secs(120)));
  }

  #[test]
  fn window_rolls_forward() {
    let limiter = RateLimiter::new(2, Duration::from_secs(100));
    let t0 = Instant::now();
    assert!(limiter.try_acquire_at("k", t0));
    assert!(limiter.try_acquire_at("k", t0 + Duration::from_secs(50)));
    assert!(!limiter.try_acquire_at("k", t0 + Duration::from_secs(99)));
    // The first attempt has aged out; the second still counts.
    assert!(limiter.try_acquire_at("k", t0 + Duration::from_secs(100)));
    assert!(!limiter.try_acquire_at("k", t0 + Duration::from_secs(120)));
  }

  #[test]
  fn released_attempt_is_available_again() {
    let limiter = RateLimiter::new(1, Duration::from_secs(100));
    let t0 = Instant::now();
    assert!(limiter.try_acquire_at("k", t0));
    limiter.release("K");
    assert!(limiter.try_acquire_at("k", t0 + Duration::from_secs(1)));
    assert!(!limiter.try_acquire_at("k", t0 + Duration::from_secs(2)));

    // Releasing an unknown key is a no-op.
    limiter.release("missing");
  }

  #[test]
  fn expired_keys_are_pruned() {
    let limiter = RateLimiter::new(1, Duration::from_secs(10));
    let t0 = Instant::now();
    assert!(limiter.try_acquire_at("old", t0));
    assert!(limiter.try_acquire_at("new", t0 + Duration::from_secs(11)));
    let map = limiter.attempts.lock().unwrap();
    assert!(!map.contains_key("old"));
  }
}
