use crate::UrlError;
use url::Url;

/// Query parameters that never identify a post
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "_ga", "_gl"];

/// Normalizes a URL for identity comparison
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Host is lowercased (done by the parser)
/// 3. Remove trailing slash from the path (except for root /)
/// 4. Remove fragment
/// 5. Remove tracking query parameters, sort the rest by key
///
/// Query parameters are kept: board sites address posts by query
/// (`?id=aoegame&no=1234`), so dropping them would merge distinct posts.
///
/// # Examples
///
/// ```
/// use community_harvest::url::normalize_url;
///
/// let url = normalize_url("https://Gall.DCInside.com/board/view/?no=7&id=aoegame#c").unwrap();
/// assert_eq!(url.as_str(), "https://gall.dcinside.com/board/view?id=aoegame&no=7");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Identity key used for URL deduplication
///
/// Unparseable input falls back to its trimmed, lowercased text without a
/// trailing slash, so it still deduplicates against itself.
pub fn dedup_key(url_str: &str) -> String {
    match normalize_url(url_str) {
        Ok(url) => url.into(),
        Err(_) => url_str.trim().trim_end_matches('/').to_lowercase(),
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
