//! DOM extraction helpers shared by all parsers

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Query keys that select a comment page rather than a post
pub const PAGING_KEYS: &[&str] = &["page", "cpage", "comment_page", "p", "cp", "cmt_page", "pg"];

fn count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*").expect("count pattern is valid"))
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|\D)(\d{4}|\d{2})[./-](\d{1,2})[./-](\d{1,2})(?:\.?\s*(\d{1,2}):(\d{2})(?::(\d{2}))?)?",
        )
        .expect("date pattern is valid")
    })
}

fn spaces_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{a0}]+").expect("space pattern is valid"))
}

/// Compiles CSS selectors, dropping any that fail to parse
pub fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .collect()
}

/// Returns the first element matched by the first selector that matches anything
pub fn select_first<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    compile(selectors)
        .iter()
        .find_map(|selector| scope.select(selector).next())
}

/// Returns every element matched by the first selector that matches anything
pub fn select_all<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for selector in compile(selectors) {
        let found: Vec<ElementRef<'a>> = scope.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Trimmed text pieces under `scope`, excluding script/style and `skip` subtrees
pub fn text_pieces(scope: ElementRef<'_>, skip: &[Selector]) -> Vec<String> {
    let mut pieces = Vec::new();
    for node in scope.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != scope.id())
            .filter_map(ElementRef::wrap)
            .any(|element| is_skipped(element, skip));
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(spaces_regex().replace_all(trimmed, " ").into_owned());
        }
    }
    pieces
}

fn is_skipped(element: ElementRef<'_>, skip: &[Selector]) -> bool {
    matches!(
        element.value().name(),
        "script" | "style" | "noscript" | "template"
    ) || skip.iter().any(|selector| selector.matches(&element))
}

/// Single-line text of an element
pub fn inline_text(element: ElementRef<'_>) -> String {
    text_pieces(element, &[]).join(" ")
}

/// Multi-line text of an element, one line per text node
pub fn block_text(element: ElementRef<'_>, skip: &[Selector]) -> String {
    text_pieces(element, skip).join("\n")
}

/// Text of the first selector whose first match has non-empty text
pub fn first_text(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    compile(selectors).iter().find_map(|selector| {
        scope
            .select(selector)
            .next()
            .map(inline_text)
            .filter(|text| !text.is_empty())
    })
}

/// Author name, preferring a `data-nick` attribute over the element text
pub fn first_author(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    compile(selectors).iter().find_map(|selector| {
        let element = scope.select(selector).next()?;
        element
            .value()
            .attr("data-nick")
            .map(|nick| nick.trim().to_string())
            .filter(|nick| !nick.is_empty())
            .or_else(|| Some(inline_text(element)).filter(|text| !text.is_empty()))
    })
}

/// Timestamp from the first selector that yields one
///
/// The `title` and `datetime` attributes are consulted before the text,
/// since boards often show a shortened date and keep the full one there.
pub fn first_date(scope: ElementRef<'_>, selectors: &[&str]) -> Option<NaiveDateTime> {
    compile(selectors).iter().find_map(|selector| {
        let element = scope.select(selector).next()?;
        element_date(element)
    })
}

fn element_date(element: ElementRef<'_>) -> Option<NaiveDateTime> {
    let attrs = element.value();
    attrs
        .attr("title")
        .and_then(parse_date)
        .or_else(|| attrs.attr("datetime").and_then(parse_iso_datetime))
        .or_else(|| parse_date(&inline_text(element)))
}

/// Number from the first selector whose first match contains one
pub fn first_count(scope: ElementRef<'_>, selectors: &[&str]) -> Option<u64> {
    compile(selectors).iter().find_map(|selector| {
        let element = scope.select(selector).next()?;
        parse_count(&inline_text(element))
    })
}

/// Parses the first number in `text`, ignoring thousands separators
///
/// ```
/// use community_harvest::parsers::extract::parse_count;
///
/// assert_eq!(parse_count("조회 1,234"), Some(1234));
/// assert_eq!(parse_count("없음"), None);
/// ```
pub fn parse_count(text: &str) -> Option<u64> {
    count_regex()
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Finds `label` followed by a number anywhere in `text`, e.g. `조회: 1,024`
pub fn labelled_count(text: &str, label: &str) -> Option<u64> {
    let pattern = format!(r"{}[:\s]*([0-9][0-9,]*)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Parses board-style dates such as `2024.01.15 13:05`, `2024-01-15` or `24.01.15 13:05:09`
///
/// Two-digit years are taken as 20xx. Dates without a time are midnight.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    for caps in date_regex().captures_iter(text) {
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        let Some(year) = number(1) else { continue };
        let year = if year < 100 { year + 2000 } else { year };
        let (Some(month), Some(day)) = (number(2), number(3)) else {
            continue;
        };

        let Some(date) = NaiveDate::from_ymd_opt(year as i32, month, day) else {
            continue;
        };

        let time = match (number(4), number(5)) {
            (Some(hour), Some(minute)) => date.and_hms_opt(hour, minute, number(6).unwrap_or(0)),
            _ => date.and_hms_opt(0, 0, 0),
        };
        if time.is_some() {
            return time;
        }
    }
    None
}

/// Parses an RFC 3339 / ISO 8601 attribute value, keeping its wall-clock time
pub fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| parse_date(value))
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None for script, mail, phone and data links, bare fragments,
/// and anything that does not resolve to HTTP(S).
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = base_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Returns true if `candidate` is a page of the same post as `post_url`
///
/// Scheme, host and path must match, and every non-paging query pair of
/// the post URL must be present unchanged.
pub fn is_same_post(post_url: &Url, candidate: &Url) -> bool {
    if post_url.scheme() != candidate.scheme()
        || post_url.host_str() != candidate.host_str()
        || post_url.port_or_known_default() != candidate.port_or_known_default()
        || post_url.path().trim_end_matches('/') != candidate.path().trim_end_matches('/')
    {
        return false;
    }

    let candidate_pairs: Vec<(String, String)> = candidate
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    post_url
        .query_pairs()
        .filter(|(key, _)| !is_paging_key(key))
        .all(|(key, value)| {
            candidate_pairs
                .iter()
                .any(|(k, v)| k == key.as_ref() && v == value.as_ref())
        })
}

fn is_paging_key(key: &str) -> bool {
    PAGING_KEYS.contains(&key.to_ascii_lowercase().as_str())
}

/// Page number carried by a URL's paging parameter, if any
pub fn page_number(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| is_paging_key(key))
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Finds the link to comment page `current_page + 1` of the post at `post_url`
///
/// Links marked as "next" (`rel="next"` or a class containing `next`) are
/// preferred; otherwise any same-post link whose paging parameter equals the
/// wanted page is used. Links leaving the post are never followed.
pub fn find_next_page(html: &str, post_url: &Url, current_page: u32) -> Option<Url> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").ok()?;
    let wanted = current_page.saturating_add(1);

    let candidates: Vec<(Url, bool)> = document
        .select(&anchors)
        .filter_map(|anchor| {
            let element = anchor.value();
            let url = resolve_link(element.attr("href")?, post_url)?;
            if !is_same_post(post_url, &url) {
                return None;
            }
            let marked_next = element
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")))
                .unwrap_or(false)
                || element
                    .attr("class")
                    .map(|class| class.to_ascii_lowercase().contains("next"))
                    .unwrap_or(false);
            Some((url, marked_next))
        })
        .collect();

    candidates
        .iter()
        .find(|(url, marked_next)| *marked_next && page_number(url) == Some(wanted))
        .or_else(|| {
            candidates
                .iter()
                .find(|(url, _)| page_number(url) == Some(wanted))
        })
        .or_else(|| {
            candidates.iter().find(|(url, marked_next)| {
                *marked_next && page_number(url).map_or(true, |n| n > current_page)
            })
        })
        .map(|(url, _)| url.clone())
}
