use crate::model::SearchResult;
use crate::relevance::{deduplicate_results, filter, score_results};
use crate::search::{CacheKey, CacheStats, SearchAdapter, SearchCache};
use crate::{AdapterFailure, ProviderError, SearchError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What one `search` call produced and how
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Scored, filtered and deduplicated results; shared with the cache
    pub results: Arc<Vec<SearchResult>>,
    /// Adapter that produced the results, `None` on a cache hit
    pub adapter: Option<String>,
    /// Adapters whose `search` was invoked, in order
    pub attempted: Vec<String>,
    /// Why each skipped or failed adapter did not produce results
    pub failures: Vec<AdapterFailure>,
    pub from_cache: bool,
}

/// Failover search across adapters with result caching
///
/// Adapters are tried in registration order starting from the one that
/// last succeeded. A failed adapter is never blacklisted: every call
/// restarts from the current pointer.
pub struct SearchEngineManager {
    adapters: Vec<Arc<dyn SearchAdapter>>,
    current: AtomicUsize,
    cache: SearchCache,
    threshold: f64,
}

impl SearchEngineManager {
    pub fn new(adapters: Vec<Arc<dyn SearchAdapter>>, cache_ttl: Duration, threshold: f64) -> Self {
        Self {
            adapters,
            current: AtomicUsize::new(0),
            cache: SearchCache::new(cache_ttl),
            threshold,
        }
    }

    /// Appends an adapter at the end of the failover order
    pub fn register_adapter(&mut self, adapter: Arc<dyn SearchAdapter>) {
        tracing::debug!("Registered search adapter {}", adapter.name());
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[Arc<dyn SearchAdapter>] {
        &self.adapters
    }

    /// Names of adapters currently reporting themselves available
    pub fn available_adapters(&self) -> Vec<String> {
        self.adapters
            .iter()
            .filter(|adapter| adapter.is_available())
            .map(|adapter| adapter.name().to_string())
            .collect()
    }

    /// Index of the adapter tried first on the next cache miss
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Points failover back at the first adapter and clears adapter throttles
    pub fn reset(&self) {
        self.current.store(0, Ordering::Relaxed);
        for adapter in &self.adapters {
            adapter.reset_throttle();
        }
    }

    /// Finds relevant candidates for `keywords` on `site`
    ///
    /// A cache hit returns the stored results without touching any adapter.
    /// On a miss, each adapter in turn is asked for results; the first
    /// non-empty answer is scored, filtered against the relevance threshold,
    /// deduplicated, cached and returned. If no adapter produces results the
    /// query fails with [`SearchError::Exhausted`].
    pub async fn search<S: AsRef<str>>(
        &self,
        keywords: &[S],
        site: &str,
        max_results: usize,
    ) -> Result<SearchOutcome, SearchError> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.as_ref().to_string()).collect();
        let key = CacheKey::new(&keywords, site, max_results);

        if let Some(results) = self.cache.get(&key) {
            tracing::debug!(site = %site, key = %key.fingerprint(), "Search cache hit");
            return Ok(SearchOutcome {
                results,
                adapter: None,
                attempted: Vec::new(),
                failures: Vec::new(),
                from_cache: true,
            });
        }
        tracing::debug!(site = %site, key = %key.fingerprint(), "Search cache miss");

        if self.adapters.is_empty() {
            return Err(SearchError::NoAdapters);
        }

        let count = self.adapters.len();
        let start = self.current.load(Ordering::Relaxed) % count;
        let mut attempted = Vec::new();
        let mut failures = Vec::new();

        for offset in 0..count {
            let index = (start + offset) % count;
            let adapter = &self.adapters[index];
            let name = adapter.name().to_string();

            if !adapter.is_available() {
                tracing::debug!(adapter = %name, "Adapter unavailable, skipping");
                failures.push(AdapterFailure {
                    adapter: name.clone(),
                    error: ProviderError::Unavailable { adapter: name },
                });
                continue;
            }

            attempted.push(name.clone());
            let raw = match adapter.search(&keywords, site, max_results).await {
                Ok(raw) if raw.is_empty() => {
                    tracing::warn!(adapter = %name, site = %site, "No results, trying next adapter");
                    failures.push(AdapterFailure {
                        adapter: name.clone(),
                        error: ProviderError::Empty { adapter: name },
                    });
                    continue;
                }
                Ok(raw) => raw,
                Err(error) => {
                    tracing::warn!(adapter = %name, site = %site, "Search failed: {}, trying next adapter", error);
                    failures.push(AdapterFailure {
                        adapter: name,
                        error,
                    });
                    continue;
                }
            };

            let found = raw.len().min(max_results);
            let scored = score_results(raw.into_iter().take(max_results).collect(), &keywords);
            let relevant = deduplicate_results(filter(scored, self.threshold));

            tracing::info!(
                adapter = %name,
                site = %site,
                "{} results, {} above relevance threshold {}",
                found,
                relevant.len(),
                self.threshold
            );

            self.current.store(index, Ordering::Relaxed);
            let results = self.cache.set(key, relevant);

            return Ok(SearchOutcome {
                results,
                adapter: Some(name),
                attempted,
                failures,
                from_cache: false,
            });
        }

        tracing::error!(site = %site, "All search adapters failed for {:?}", keywords);
        Err(SearchError::Exhausted {
            keywords,
            site: site.to_string(),
            failures,
        })
    }
}

impl std::fmt::Debug for SearchEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
        f.debug_struct("SearchEngineManager")
            .field("adapters", &names)
            .field("current", &self.current_index())
            .field("threshold", &self.threshold)
            .field("cache", &self.cache)
            .finish()
    }
}
