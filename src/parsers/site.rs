//! Selector tables for boards with known markup
//!
//! Each community site is described by a [`SiteRules`] value; the parsing
//! routines here turn a page into records according to those rules and
//! fail with [`ParseError`] when the page does not have the expected shape.

use crate::model::{Comment, PostContent};
use crate::parsers::extract::{
    block_text, compile, first_author, first_count, first_date, first_text, inline_text,
    labelled_count, resolve_link, select_all, select_first, text_pieces,
};
use crate::parsers::ListingEntry;
use crate::ParseError;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Bodies this short are treated as a missing body
const MIN_BODY_CHARS: usize = 10;

/// Markup conventions of one community site
#[derive(Debug)]
pub struct SiteRules {
    /// Parser and site name, e.g. `inven`
    pub name: &'static str,
    pub domains: &'static [&'static str],

    pub title: &'static [&'static str],
    /// Tag used when none of the title selectors match
    pub title_fallback: &'static str,
    /// Strip a leading `[category]` tag from titles
    pub strip_title_prefix: bool,
    pub body: &'static [&'static str],
    /// Subtrees dropped from the body (ads, banners)
    pub body_noise: &'static [&'static str],
    /// Literal strings removed from the body text
    pub body_signatures: &'static [&'static str],
    pub author: &'static [&'static str],
    pub date: &'static [&'static str],
    pub views: &'static [&'static str],
    pub likes: &'static [&'static str],

    pub comment_items: &'static [&'static str],
    /// A comment containing any of these is deleted and skipped
    pub comment_deleted: &'static [&'static str],
    pub comment_author: &'static [&'static str],
    pub comment_content: &'static [&'static str],
    /// Subtrees dropped when falling back to the whole comment text
    pub comment_meta: &'static [&'static str],
    pub comment_date: &'static [&'static str],
    pub comment_likes: &'static [&'static str],

    /// Post links on a board listing page
    pub listing: &'static [&'static str],
}

fn title_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[[^\]]*\]\s*").expect("title prefix pattern is valid"))
}

/// Parses a post page; comments on the page are included
pub fn parse_post(
    rules: &SiteRules,
    html: &str,
    url: &Url,
    keyword: &str,
) -> Result<PostContent, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = extract_title(rules, root).ok_or(ParseError::MissingNode {
        parser: rules.name,
        node: "title",
    })?;
    let body = extract_body(rules, root).ok_or(ParseError::MissingNode {
        parser: rules.name,
        node: "body",
    })?;

    let page_text = || inline_text(root);

    let mut post = PostContent::new(url.as_str(), rules.name);
    post.title = title;
    post.body = body;
    post.keyword = keyword.to_string();
    post.author = first_author(root, rules.author);
    post.created_at = first_date(root, rules.date);
    post.view_count = first_count(root, rules.views)
        .or_else(|| labelled_count(&page_text(), "조회"))
        .unwrap_or(0);
    post.like_count = first_count(root, rules.likes)
        .or_else(|| labelled_count(&page_text(), "추천"))
        .unwrap_or(0);
    post.comments = comments_in(rules, root);

    Ok(post)
}

/// Parses the comments on one page; a page without comments yields none
pub fn parse_comments(rules: &SiteRules, html: &str) -> Vec<Comment> {
    let document = Html::parse_document(html);
    comments_in(rules, document.root_element())
}

/// Extracts post links from a board listing page, deduplicated in page order
pub fn parse_listing(rules: &SiteRules, html: &str, base: &Url) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    select_all(document.root_element(), rules.listing)
        .into_iter()
        .filter_map(|anchor| {
            let url = resolve_link(anchor.value().attr("href")?, base)?;
            let title = inline_text(anchor);
            if title.is_empty() || !seen.insert(url.to_string()) {
                return None;
            }
            Some(ListingEntry {
                url: url.to_string(),
                title: clean_title(rules, &title),
            })
        })
        .collect()
}

fn extract_title(rules: &SiteRules, root: ElementRef<'_>) -> Option<String> {
    first_text(root, rules.title)
        .map(|title| clean_title(rules, &title))
        .filter(|title| !title.is_empty())
        .or_else(|| first_text(root, &[rules.title_fallback]))
}

fn clean_title(rules: &SiteRules, title: &str) -> String {
    if rules.strip_title_prefix {
        title_prefix_regex().replace(title, "").trim().to_string()
    } else {
        title.trim().to_string()
    }
}

fn extract_body(rules: &SiteRules, root: ElementRef<'_>) -> Option<String> {
    let noise = compile(rules.body_noise);

    compile(rules.body).iter().find_map(|selector| {
        let element = root.select(selector).next()?;
        let mut text = block_text(element, &noise);
        for signature in rules.body_signatures {
            text = text.replace(signature, "");
        }
        let text = text.trim().to_string();
        (text.chars().count() > MIN_BODY_CHARS).then_some(text)
    })
}

fn comments_in(rules: &SiteRules, root: ElementRef<'_>) -> Vec<Comment> {
    select_all(root, rules.comment_items)
        .into_iter()
        .filter_map(|item| parse_comment_item(rules, item))
        .collect()
}

fn parse_comment_item(rules: &SiteRules, item: ElementRef<'_>) -> Option<Comment> {
    if select_first(item, rules.comment_deleted).is_some() {
        return None;
    }

    let content = select_first(item, rules.comment_content)
        .map(inline_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| text_pieces(item, &compile(rules.comment_meta)).join(" "));
    if content.is_empty() {
        return None;
    }

    let author = first_author(item, rules.comment_author).unwrap_or_default();
    let mut comment = Comment::new(author, content);
    comment.created_at = first_date(item, rules.comment_date);
    comment.like_count = first_count(item, rules.comment_likes).unwrap_or(0);
    Some(comment)
}
