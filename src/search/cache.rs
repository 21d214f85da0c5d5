//! Query-keyed cache of filtered search results
//!
//! Entries are immutable once written and replaced wholesale by the next
//! `set`; expired entries stay in place until overwritten or swept by
//! [`SearchCache::cleanup_expired`].

use crate::model::SearchResult;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Identity of one logical query: keywords, site and result limit
///
/// Keywords are trimmed, lowercased and sorted, so the same set in any order
/// maps to the same key. The site is part of the key; results never bleed
/// between sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    keywords: Vec<String>,
    site: String,
    max_results: usize,
}

impl CacheKey {
    pub fn new<S: AsRef<str>>(keywords: &[S], site: &str, max_results: usize) -> Self {
        let mut keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        keywords.sort();

        Self {
            keywords,
            site: site.trim().to_lowercase(),
            max_results,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Stable hex digest of the key, for log correlation
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for keyword in &self.keywords {
            hasher.update(keyword.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        hasher.update(self.site.as_bytes());
        hasher.update([0x1e]);
        hasher.update(self.max_results.to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] site:{} max:{}",
            self.keywords.join(", "),
            self.site,
            self.max_results
        )
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    results: Arc<Vec<SearchResult>>,
    stored_at: DateTime<Utc>,
}

/// Entry counts reported by [`SearchCache::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub ttl: Duration,
}

/// TTL-bounded search result cache, safe for concurrent lookups
#[derive(Debug)]
pub struct SearchCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored results if they are younger than the TTL
    ///
    /// A hit hands back the same shared allocation that was stored.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<SearchResult>>> {
        self.get_at(key, Utc::now())
    }

    /// [`get`](Self::get) evaluated at an explicit instant
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Arc<Vec<SearchResult>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        self.is_fresh(entry, now).then(|| Arc::clone(&entry.results))
    }

    /// Stores results under `key`, replacing any previous entry
    pub fn set(&self, key: CacheKey, results: Vec<SearchResult>) -> Arc<Vec<SearchResult>> {
        self.set_at(key, results, Utc::now())
    }

    /// [`set`](Self::set) with an explicit storage time
    pub fn set_at(
        &self,
        key: CacheKey,
        results: Vec<SearchResult>,
        stored_at: DateTime<Utc>,
    ) -> Arc<Vec<SearchResult>> {
        let results = Arc::new(results);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                results: Arc::clone(&results),
                stored_at,
            },
        );
        results
    }

    /// Removes one entry; returns true if it existed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Drops every expired entry; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let valid = entries
            .values()
            .filter(|entry| self.is_fresh(entry, now))
            .count();

        CacheStats {
            total: entries.len(),
            valid,
            expired: entries.len() - valid,
            ttl: self.ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            // Stored "in the future" relative to `now`: age is zero
            Err(_) => !self.ttl.is_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn results(n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| SearchResult::new(format!("https://ruliweb.com/read/{i}"), "제목", ""))
            .collect()
    }

    #[test]
    fn test_key_ignores_keyword_order_and_case() {
        let a = CacheKey::new(&["Lag", "서버"], "Ruliweb.com", 10);
        let b = CacheKey::new(&["서버", "lag"], "ruliweb.com", 10);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_key_distinguishes_site_and_limit() {
        let base = CacheKey::new(&["렉"], "inven.co.kr", 10);
        assert_ne!(base, CacheKey::new(&["렉"], "ruliweb.com", 10));
        assert_ne!(base, CacheKey::new(&["렉"], "inven.co.kr", 5));
        assert_ne!(base, CacheKey::new(&["렉", "버그"], "inven.co.kr", 10));
        assert_ne!(
            base.fingerprint(),
            CacheKey::new(&["렉"], "inven.co.kr", 5).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_does_not_merge_keyword_boundaries() {
        let joined = CacheKey::new(&["ab"], "x.com", 1);
        let split = CacheKey::new(&["a", "b"], "x.com", 1);
        assert_ne!(joined.fingerprint(), split.fingerprint());
    }

    #[test]
    fn test_hit_returns_same_allocation() {
        let cache = SearchCache::new(Duration::from_secs(3600));
        let key = CacheKey::new(&["렉"], "inven.co.kr", 10);
        let stored = cache.set(key.clone(), results(3));

        let hit = cache.get(&key).unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
    }

    #[test]
    fn test_expiry_boundary() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let key = CacheKey::new(&["렉"], "inven.co.kr", 10);
        let t0 = Utc::now();
        cache.set_at(key.clone(), results(1), t0);

        assert!(cache.get_at(&key, t0 + TimeDelta::seconds(59)).is_some());
        assert!(cache.get_at(&key, t0 + TimeDelta::seconds(60)).is_none());
        // Expired entries are not deleted by lookups
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_always_misses() {
        let cache = SearchCache::new(Duration::ZERO);
        let key = CacheKey::new(&["렉"], "inven.co.kr", 10);
        cache.set(key.clone(), results(1));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let key = CacheKey::new(&["렉"], "inven.co.kr", 10);
        cache.set(key.clone(), results(1));
        cache.set(key.clone(), results(4));
        assert_eq!(cache.get(&key).unwrap().len(), 4);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cleanup_and_stats() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let old = CacheKey::new(&["a"], "x.com", 1);
        let fresh = CacheKey::new(&["b"], "x.com", 1);
        cache.set_at(old.clone(), results(1), Utc::now() - TimeDelta::seconds(120));
        cache.set(fresh.clone(), results(1));

        let stats = cache.stats();
        assert_eq!((stats.total, stats.valid, stats.expired), (2, 1, 1));

        assert_eq!(cache.cleanup_expired(), 1);
        assert!(cache.get(&fresh).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let key = CacheKey::new(&["a"], "x.com", 1);
        cache.set(key.clone(), results(1));

        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));

        cache.set(key.clone(), results(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
