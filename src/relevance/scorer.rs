use crate::model::SearchResult;

/// Byte offset up to which a keyword match counts as "early"
pub const EARLY_WINDOW: usize = 300;

const EARLY_WEIGHT: f64 = 1.0;
const LATE_WEIGHT: f64 = 0.5;
const COVERAGE_SHARE: f64 = 0.6;
const FREQUENCY_SHARE: f64 = 0.4;

/// Scores how well `content` matches `keywords`, in [0.0, 1.0]
///
/// Matching is case-insensitive substring search. Each occurrence weighs
/// 1.0 within the first [`EARLY_WINDOW`] bytes and 0.5 after it. The score
/// blends keyword coverage (share of distinct keywords found) with a
/// saturating function of the weighted occurrence count:
///
/// ```text
/// score = 0.6 * matched / total + 0.4 * (1 - 1 / (1 + 0.5 * weighted))
/// ```
///
/// Zero matches score 0.0. Adding occurrences never lowers the score.
///
/// ```
/// use community_harvest::relevance::calculate_score;
///
/// assert_eq!(calculate_score("unrelated text", &["패치"]), 0.0);
/// assert!(calculate_score("패치 후기: 패치 이후 버그", &["패치"]) > 0.5);
/// ```
pub fn calculate_score<S: AsRef<str>>(content: &str, keywords: &[S]) -> f64 {
    let mut needles: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    needles.sort();
    needles.dedup();

    if needles.is_empty() {
        return 0.0;
    }

    let haystack = content.to_lowercase();
    let mut matched = 0usize;
    let mut weighted = 0.0f64;

    for needle in &needles {
        let mut found = false;
        for (offset, _) in haystack.match_indices(needle.as_str()) {
            found = true;
            weighted += if offset < EARLY_WINDOW {
                EARLY_WEIGHT
            } else {
                LATE_WEIGHT
            };
        }
        if found {
            matched += 1;
        }
    }

    if matched == 0 {
        return 0.0;
    }

    let coverage = matched as f64 / needles.len() as f64;
    let frequency = 1.0 - 1.0 / (1.0 + 0.5 * weighted);

    (COVERAGE_SHARE * coverage + FREQUENCY_SHARE * frequency).clamp(0.0, 1.0)
}

/// Scores a search result from its title followed by its snippet
///
/// Title matches land in the early window, so they outweigh matches deep
/// in a long snippet.
pub fn score_result<S: AsRef<str>>(result: &SearchResult, keywords: &[S]) -> f64 {
    let content = format!("{}\n{}", result.title, result.snippet);
    calculate_score(&content, keywords)
}

/// Assigns `relevance_score` to every result
pub fn score_results<S: AsRef<str>>(results: Vec<SearchResult>, keywords: &[S]) -> Vec<SearchResult> {
    results
        .into_iter()
        .map(|mut result| {
            result.relevance_score = score_result(&result, keywords);
            result
        })
        .collect()
}

/// Keeps results scoring at least `threshold`, preserving their order
pub fn filter(results: Vec<SearchResult>, threshold: f64) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| r.relevance_score >= threshold)
        .collect()
}
