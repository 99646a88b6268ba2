use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

/// Login attempts allowed in a burst per username.
pub const LOGIN_BURST: f64 = 5.0;
/// One attempt regained every ten seconds.
pub const LOGIN_REFILL_PER_SEC: f64 = 0.1;

/// Remaining attempts of one username, as of `updated`.
struct AttemptBucket {
    remaining: f64,
    updated: Instant,
}

/// Per-username login throttle (token bucket).
pub struct LoginThrottle {
    refill_per_sec: f64,
    burst: f64,
    buckets: Mutex<HashMap<String, AttemptBucket>>,
}

impl LoginThrottle {
    pub fn new(refill_per_sec: f64, burst: f64) -> Self {
        Self {
            refill_per_sec,
            burst,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub async fn allow(&self, username: &str) -> bool {
        self.allow_at(username, Instant::now()).await
    }

    async fn allow_at(&self, username: &str, now: Instant) -> bool {
        let key = username.trim().to_lowercase();
        let mut buckets = self.buckets.lock().await;

        // Usernames back at full burst carry no state worth keeping.
        buckets.retain(|k, bucket| *k == key || self.refilled(bucket, now) < self.burst);

        let bucket = buckets.entry(key).or_insert(AttemptBucket {
            remaining: self.burst,
            updated: now,
        });
        bucket.remaining = self.refilled(bucket, now);
        bucket.updated = now;

        if bucket.remaining >= 1.0 {
            bucket.remaining -= 1.0;
            true
        } else {
            false
        }
    }

    fn refilled(&self, bucket: &AttemptBucket, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(bucket.updated).as_secs_f64();
        (bucket.remaining + elapsed * self.refill_per_sec).min(self.burst)
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(LOGIN_REFILL_PER_SEC, LOGIN_BURST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_login_throttle_is_per_username() {
        let throttle = LoginThrottle::default();
        for _ in 0..5 {
            assert!(throttle.allow("officer").await);
        }
        assert!(!throttle.allow("officer").await);
        assert!(!throttle.allow("  OFFICER ").await);
        assert!(throttle.allow("someone_else").await);
    }

    #[tokio::test]
    async fn test_one_attempt_regained_every_ten_seconds() {
        let throttle = LoginThrottle::default();
        let start = Instant::now();
        for _ in 0..5 {
            assert!(throttle.allow_at("officer", start).await);
        }
        assert!(!throttle.allow_at("officer", start).await);

        assert!(!throttle.allow_at("officer", start + Duration::from_secs(9)).await);
        assert!(throttle.allow_at("officer", start + Duration::from_secs(10)).await);
        assert!(!throttle.allow_at("officer", start + Duration::from_secs(11)).await);

        // A long pause restores the burst, never more
        let later = start + Duration::from_secs(600);
        for _ in 0..5 {
            assert!(throttle.allow_at("officer", later).await);
        }
        assert!(!throttle.allow_at("officer", later).await);
    }

    #[tokio::test]
    async fn test_refilled_usernames_are_pruned() {
        let throttle = LoginThrottle::default();
        let start = Instant::now();
        assert!(throttle.allow_at("officer", start).await);
        assert!(throttle.allow_at("clerk", start).await);
        assert_eq!(throttle.buckets.lock().await.len(), 2);

        // Both are still short of a full burst
        assert!(throttle.allow_at("clerk", start + Duration::from_secs(5)).await);
        assert_eq!(throttle.buckets.lock().await.len(), 2);

        // Ten seconds on, "officer" is full again and is forgotten
        assert!(throttle.allow_at("clerk", start + Duration::from_secs(10)).await);
        let buckets = throttle.buckets.lock().await;
        assert_eq!(buckets.len(), 1);
        assert!(buckets.contains_key("clerk"));
    }
}
