//! URL handling module for Community-Harvest
//!
//! Domain extraction, subdomain-aware matching against registered domains,
//! and the normalization that defines URL identity for deduplication.

mod domain;
mod matcher;
mod normalize;

pub use domain::{domain_of, extract_domain};
pub use matcher::{best_match, matches_domain};
pub use normalize::{dedup_key, normalize_url};

/// Short site label for a host, e.g. `inven` for `www.inven.co.kr`
///
/// Known community sites get their conventional names; anything else is
/// labelled with its host.
pub fn site_label(host: &str) -> String {
    const KNOWN: &[(&str, &str)] = &[
        ("inven.co.kr", "inven"),
        ("ruliweb.com", "ruliweb"),
        ("dcinside.com", "dcinside"),
    ];

    KNOWN
        .iter()
        .find(|(domain, _)| matches_domain(domain, host))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| host.to_string())
}
