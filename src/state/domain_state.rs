use std::time::Duration;
use tokio::time::Instant;

/// Highest exponent used when computing backoff, keeps `2^level` finite
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Pacing state for one domain
///
/// Created lazily on the first request to a domain and kept for the
/// lifetime of the rate limiter. All mutation happens under the limiter's
/// per-domain lock.
#[derive(Debug, Clone)]
pub struct DomainRateState {
    pub domain: String,

    /// When the last request to this domain was released
    pub last_request_at: Option<Instant>,

    /// Zero while the domain is healthy; the last retry count while backing off
    pub backoff_level: u32,

    /// Set once throttle retries are exhausted; the domain is skipped for the run
    pub suspended: bool,

    /// Requests released so far
    pub request_count: u64,

    /// Throttling responses seen so far
    pub throttle_count: u64,
}

impl DomainRateState {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            last_request_at: None,
            backoff_level: 0,
            suspended: false,
            request_count: 0,
            throttle_count: 0,
        }
    }

    /// Returns true while a backoff window is active
    pub fn is_backing_off(&self) -> bool {
        self.backoff_level > 0
    }

    /// Interval the next request must keep from the previous one, before jitter
    ///
    /// While backing off this is `backoff_base * 2^level`; otherwise the
    /// domain's normal minimum delay.
    pub fn base_delay(&self, normal: Duration, backoff_base: Duration) -> Duration {
        if self.is_backing_off() {
            let exponent = self.backoff_level.min(MAX_BACKOFF_EXPONENT);
            backoff_base.saturating_mul(1u32 << exponent)
        } else {
            normal
        }
    }

    /// Time still to wait before `interval` has passed since the last request
    pub fn time_until_next_request(&self, interval: Duration, now: Instant) -> Duration {
        match self.last_request_at {
            Some(last) => interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Records that a request was released at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_at = Some(now);
        self.request_count += 1;
    }

    /// Enters (or deepens) backoff after a throttling response
    pub fn record_throttle(&mut self, retry_count: u32) {
        self.throttle_count += 1;
        self.backoff_level = retry_count.max(1);
    }

    /// Clears backoff after a clean response
    pub fn reset_backoff(&mut self) {
        self.backoff_level = 0;
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Lifts a suspension and clears backoff
    pub fn resume(&mut self) {
        self.suspended = false;
        self.backoff_level = 0;
    }
}
