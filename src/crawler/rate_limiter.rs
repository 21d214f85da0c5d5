//! Per-domain request pacing
//!
//! This module handles:
//! - Minimum delay between requests to the same domain (default or per-domain override)
//! - Random jitter added to every delay
//! - Exponential backoff after throttling responses
//! - Suspending a domain once its throttle retries are exhausted
//!
//! Each domain has its own lock, held while the caller sleeps, so requests
//! to one domain are serialized without delaying any other domain.

use crate::config::CrawlerConfig;
use crate::state::DomainRateState;
use crate::url::{best_match, domain_of};
use crate::{ConfigError, CrawlError};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct LimiterSettings {
    default_delay: Duration,
    domain_delays: HashMap<String, Duration>,
    jitter_min: Duration,
    jitter_max: Duration,
    jitter_enabled: bool,
    backoff_base: Duration,
    max_retries: u32,
}

/// Polite, jittered, backoff-aware pacing per target domain
///
/// Domain arguments accept either a bare domain or a full URL.
#[derive(Debug)]
pub struct RateLimiter {
    domains: Mutex<HashMap<String, Arc<tokio::sync::Mutex<DomainRateState>>>>,
    settings: RwLock<LimiterSettings>,
}

impl RateLimiter {
    /// Creates a limiter with a one-second backoff base
    pub fn new(default_delay: Duration, jitter: (Duration, Duration), max_retries: u32) -> Self {
        let (jitter_min, jitter_max) = if jitter.0 <= jitter.1 {
            jitter
        } else {
            (jitter.1, jitter.0)
        };

        Self {
            domains: Mutex::new(HashMap::new()),
            settings: RwLock::new(LimiterSettings {
                default_delay,
                domain_delays: HashMap::new(),
                jitter_min,
                jitter_max,
                jitter_enabled: true,
                backoff_base: Duration::from_secs(1),
                max_retries,
            }),
        }
    }

    /// Creates a limiter from the `[crawler]` configuration section
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let limiter = Self::new(
            config.default_delay(),
            config.jitter_range(),
            config.max_retries,
        )
        .with_backoff_base(config.backoff_base());

        for (domain, delay) in &config.domain_delays {
            limiter.set_domain_delay(domain, Duration::from_secs_f64(*delay));
        }
        limiter
    }

    /// Sets the unit of exponential backoff (`base * 2^level`)
    pub fn with_backoff_base(self, base: Duration) -> Self {
        self.settings_mut().backoff_base = base;
        self
    }

    /// Overrides the minimum delay for one domain and its subdomains
    pub fn set_domain_delay(&self, domain: &str, delay: Duration) {
        let domain = domain_key(domain);
        self.settings_mut().domain_delays.insert(domain, delay);
    }

    /// Minimum delay for a domain before jitter and backoff
    pub fn delay_for(&self, domain: &str) -> Duration {
        settings_delay(&self.settings(), &domain_key(domain))
    }

    /// Replaces the jitter range; `min` must not exceed `max`
    pub fn set_jitter_range(&self, min: Duration, max: Duration) -> Result<(), ConfigError> {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "jitter minimum {:?} exceeds maximum {:?}",
                min, max
            )));
        }
        let mut settings = self.settings_mut();
        settings.jitter_min = min;
        settings.jitter_max = max;
        Ok(())
    }

    pub fn set_jitter_enabled(&self, enabled: bool) {
        self.settings_mut().jitter_enabled = enabled;
    }

    pub fn jitter_range(&self) -> (Duration, Duration) {
        let settings = self.settings();
        (settings.jitter_min, settings.jitter_max)
    }

    pub fn max_retries(&self) -> u32 {
        self.settings().max_retries
    }

    /// Suspends the caller until the next request to `domain` is allowed
    ///
    /// Returns how long the caller was held. Fails immediately for a domain
    /// suspended after exhausting its throttle retries.
    pub async fn wait(&self, domain: &str) -> Result<Duration, CrawlError> {
        let domain = domain_key(domain);
        let state = self.state_for(&domain);
        let mut state = state.lock().await;

        if state.suspended {
            return Err(CrawlError::DomainAbandoned { domain });
        }

        let (normal, backoff_base) = {
            let settings = self.settings();
            (settings_delay(&settings, &domain), settings.backoff_base)
        };
        let target = state.base_delay(normal, backoff_base) + self.sample_jitter();
        let wait = state.time_until_next_request(target, Instant::now());

        if !wait.is_zero() {
            tracing::debug!(
                domain = %domain,
                backoff_level = state.backoff_level,
                "Waiting {:?} before next request",
                wait
            );
            tokio::time::sleep(wait).await;
        }

        state.record_request(Instant::now());
        Ok(wait)
    }

    /// Records a throttling response for `domain`
    ///
    /// Enters backoff at level `retry_count`, so the next `wait` lasts
    /// `backoff_base * 2^retry_count`. Returns false once `retry_count`
    /// exceeds the retry budget; the domain is then suspended and the caller
    /// must give up on it for this run.
    pub async fn handle_rate_limit(&self, domain: &str, retry_count: u32) -> bool {
        let domain = domain_key(domain);
        let max_retries = self.max_retries();
        let state = self.state_for(&domain);
        let mut state = state.lock().await;

        state.record_throttle(retry_count);

        if retry_count > max_retries {
            state.suspend();
            tracing::warn!(
                domain = %domain,
                "Throttled {} times, suspending domain for this run",
                retry_count
            );
            false
        } else {
            tracing::info!(
                domain = %domain,
                "Throttled, backing off (retry {}/{})",
                retry_count,
                max_retries
            );
            true
        }
    }

    /// Records a transient failure; backs off without ever suspending
    pub async fn record_failure(&self, domain: &str, attempt: u32) {
        let state = self.state_for(&domain_key(domain));
        let mut state = state.lock().await;
        state.backoff_level = attempt.max(1);
    }

    /// Clears backoff after a clean response
    pub async fn record_success(&self, domain: &str) {
        let state = self.state_for(&domain_key(domain));
        let mut state = state.lock().await;
        if state.is_backing_off() {
            tracing::debug!(domain = %state.domain, "Clean response, backoff cleared");
        }
        state.reset_backoff();
    }

    pub async fn is_suspended(&self, domain: &str) -> bool {
        match self.existing_state(&domain_key(domain)) {
            Some(state) => state.lock().await.suspended,
            None => false,
        }
    }

    /// Lifts a suspension so the domain can be crawled again
    pub async fn resume_domain(&self, domain: &str) {
        if let Some(state) = self.existing_state(&domain_key(domain)) {
            state.lock().await.resume();
        }
    }

    pub async fn backoff_level(&self, domain: &str) -> u32 {
        match self.existing_state(&domain_key(domain)) {
            Some(state) => state.lock().await.backoff_level,
            None => 0,
        }
    }

    /// Copy of a domain's state, if any request has touched it
    pub async fn snapshot(&self, domain: &str) -> Option<DomainRateState> {
        let state = self.existing_state(&domain_key(domain))?;
        let state = state.lock().await;
        Some(state.clone())
    }

    fn sample_jitter(&self) -> Duration {
        let settings = self.settings();
        if !settings.jitter_enabled || settings.jitter_max.is_zero() {
            return Duration::ZERO;
        }
        let min = settings.jitter_min.as_secs_f64();
        let max = settings.jitter_max.as_secs_f64();
        Duration::from_secs_f64(rand::rng().random_range(min..=max))
    }

    fn state_for(&self, domain: &str) -> Arc<tokio::sync::Mutex<DomainRateState>> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            domains
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(DomainRateState::new(domain)))),
        )
    }

    fn existing_state(&self, domain: &str) -> Option<Arc<tokio::sync::Mutex<DomainRateState>>> {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains.get(domain).cloned()
    }

    fn settings(&self) -> std::sync::RwLockReadGuard<'_, LimiterSettings> {
        self.settings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn settings_mut(&self) -> std::sync::RwLockWriteGuard<'_, LimiterSettings> {
        self.settings.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Override for `host` or its closest parent domain, else the default.
/// Takes the settings already locked so callers never re-enter the lock.
fn settings_delay(settings: &LimiterSettings, host: &str) -> Duration {
    best_match(host, settings.domain_delays.keys().map(String::as_str))
        .and_then(|matched| settings.domain_delays.get(matched).copied())
        .unwrap_or(settings.default_delay)
}

fn domain_key(input: &str) -> String {
    domain_of(input).unwrap_or_else(|| input.trim().to_lowercase())
}
