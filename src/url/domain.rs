use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use community_harvest::url::extract_domain;
///
/// let url = Url::parse("https://gall.dcinside.com/board/view/?id=aoegame&no=1").unwrap();
/// assert_eq!(extract_domain(&url), Some("gall.dcinside.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Resolves a domain from either a bare domain or a full URL
///
/// Rate limiter and registry callers pass whichever they have at hand.
///
/// ```
/// use community_harvest::url::domain_of;
///
/// assert_eq!(domain_of("https://BBS.Ruliweb.com/x"), Some("bbs.ruliweb.com".to_string()));
/// assert_eq!(domain_of("Inven.co.kr"), Some("inven.co.kr".to_string()));
/// assert_eq!(domain_of("  "), None);
/// ```
pub fn domain_of(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.contains("://") {
        return Url::parse(input).ok().as_ref().and_then(extract_domain);
    }

    let host = input.split(['/', '?', '#']).next().unwrap_or(input);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}
