use crate::model::SearchResult;
use crate::url::dedup_key;
use std::collections::HashSet;

/// Removes repeated URLs, keeping each first occurrence in place
///
/// Identity is [`dedup_key`]: host case, trailing slashes, fragments and
/// tracking parameters do not make two URLs distinct.
pub fn deduplicate<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(AsRef::as_ref)
        .filter(|url| seen.insert(dedup_key(url)))
        .map(str::to_string)
        .collect()
}

/// Removes results whose URL already appeared earlier in the list
pub fn deduplicate_results(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(dedup_key(&r.url)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_kept_in_place() {
        let urls = [
            "https://ruliweb.com/read/2",
            "https://ruliweb.com/read/1",
            "https://ruliweb.com/read/2/",
            "https://RULIWEB.com/read/1#comments",
            "https://ruliweb.com/read/3",
        ];

        assert_eq!(
            deduplicate(&urls),
            vec![
                "https://ruliweb.com/read/2",
                "https://ruliweb.com/read/1",
                "https://ruliweb.com/read/3",
            ]
        );
    }

    #[test]
    fn test_every_distinct_url_survives() {
        let urls = [
            "https://gall.dcinside.com/board/view/?id=aoegame&no=1",
            "https://gall.dcinside.com/board/view/?id=aoegame&no=2",
            "https://gall.dcinside.com/board/view/?no=1&id=aoegame",
            "not a url",
            "not a url/",
        ];

        let unique = deduplicate(&urls);
        assert_eq!(unique.len(), 3);
        let keys: HashSet<String> = unique.iter().map(|u| dedup_key(u)).collect();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn test_empty_input() {
        let urls: [&str; 0] = [];
        assert!(deduplicate(&urls).is_empty());
    }

    #[test]
    fn test_deduplicate_results_keeps_first_score() {
        let results = vec![
            SearchResult::new("https://a.com/p", "first", "").with_score(0.7),
            SearchResult::new("https://a.com/p/", "second", "").with_score(0.9),
        ];
        let unique = deduplicate_results(results);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].title, "first");
    }
}
