//! In-process rate limiter: a `(client_identifier, path)`-keyed, one-minute
//! rolling window, bounded and evicting so a churn of distinct clients
//! can't grow the map unbounded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::error::CoreError;

const WINDOW: Duration = Duration::from_secs(60);
/// Upper bound on distinct `(client, path)` keys tracked at once; past this,
/// the least-recently-touched key is evicted to make room.
const MAX_TRACKED_KEYS: usize = 10_000;

struct Bucket {
    hits: Vec<Instant>,
    last_touched: Instant,
}

pub struct RateLimiter {
    budget_per_minute: u32,
    buckets: Arc<Mutex<HashMap<(String, String), Bucket>>>,
}

impl RateLimiter {
    pub fn new(budget_per_minute: u32) -> Self {
        Self {
            budget_per_minute,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records one hit for `(client_identifier, path)` and returns
    /// `RateLimited` if this would exceed the per-minute budget.
    pub fn check(&self, client_identifier: &str, path: &str) -> Result<(), CoreError> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        let key = (client_identifier.to_string(), path.to_string());

        if !buckets.contains_key(&key) && buckets.len() >= MAX_TRACKED_KEYS {
            evict_oldest(&mut buckets);
        }

        let bucket = buckets.entry(key).or_insert_with(|| Bucket { hits: Vec::new(), last_touched: now });
        bucket.hits.retain(|t| now.duration_since(*t) < WINDOW);
        bucket.last_touched = now;

        if bucket.hits.len() as u32 >= self.budget_per_minute {
            return Err(CoreError::RateLimited);
        }
        bucket.hits.push(now);
        Ok(())
    }
}

fn evict_oldest(buckets: &mut HashMap<(String, String), Bucket>) {
    if let Some(key) = buckets.iter().min_by_key(|(_, b)| b.last_touched).map(|(k, _)| k.clone()) {
        buckets.remove(&key);
    }
}
