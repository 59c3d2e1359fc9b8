use super::key::CacheKey;
use dashmap::DashMap;
use hickory_proto::op::Message;
use rustc_hash::FxBuildHasher;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct CachedAnswer {
    message: Message,
    expires_at: Instant,
}

/// Concurrent answer store shared by all requests.
///
/// Expired entries are dropped lazily on lookup. When the store is full, an
/// insert first purges expired entries and then evicts the entry closest to
/// expiry. The store never stays above `max_entries` once an insert
/// returns. Concurrent writers for the same key: the last one wins.
pub struct AnswerCache {
    entries: DashMap<CacheKey, CachedAnswer, FxBuildHasher>,
    max_entries: usize,
}

impl AnswerCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the stored message and its remaining lifetime in whole
    /// seconds (rounded up), or `None` when absent or expired.
    pub fn get(&self, key: &CacheKey) -> Option<(Message, u32)> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                let remaining = entry.expires_at - now;
                return Some((entry.message.clone(), ceil_secs(remaining)));
            }
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    pub fn insert(&self, key: CacheKey, message: Message, ttl: Duration) {
        if self.max_entries == 0 || ttl.is_zero() {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room();
        }

        self.entries.insert(
            key,
            CachedAnswer {
                message,
                expires_at: Instant::now() + ttl,
            },
        );

        // Concurrent inserts of new keys can each pass the check above.
        while self.entries.len() > self.max_entries {
            if !self.evict_soonest() {
                break;
            }
        }
    }

    fn make_room(&self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);

        if self.entries.len() >= self.max_entries {
            self.evict_soonest();
        }

        debug!(
            evicted = before.saturating_sub(self.entries.len()),
            "Cache full, made room"
        );
    }

    fn evict_soonest(&self) -> bool {
        let soonest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key().clone());
        match soonest {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }
}

fn ceil_secs(duration: Duration) -> u32 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
