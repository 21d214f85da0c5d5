//! Per-domain state owned by the rate limiter
//!
//! - `DomainRateState`: last request time, backoff level and suspension for one domain

mod domain_state;

pub use domain_state::DomainRateState;
