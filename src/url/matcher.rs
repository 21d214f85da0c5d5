/// Checks if a host belongs to a registered domain
///
/// A host matches when it equals the domain or is one of its subdomains.
/// Both arguments are expected in lowercase.
///
/// # Examples
///
/// ```
/// use community_harvest::url::matches_domain;
///
/// assert!(matches_domain("dcinside.com", "dcinside.com"));
/// assert!(matches_domain("dcinside.com", "gall.dcinside.com"));
/// assert!(!matches_domain("dcinside.com", "notdcinside.com"));
/// ```
pub fn matches_domain(domain: &str, host: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// Finds the most specific registered domain that a host belongs to
///
/// Exact matches win; otherwise the longest matching suffix is chosen.
pub fn best_match<'a, I>(host: &str, domains: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    domains
        .into_iter()
        .filter(|d| matches_domain(d, host))
        .max_by_key(|d| d.len())
}
