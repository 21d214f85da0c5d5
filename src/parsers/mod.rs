//! Content parsers turning fetched markup into post and comment records
//!
//! Every parser implements [`ContentParser`]. The [`ParserRegistry`] maps
//! domains to parsers and falls back to [`GenericParser`] for any host
//! without a registered parser.
//!
//! # Components
//!
//! - `GenericParser`: heuristic extraction for arbitrary pages, never fails
//! - `InvenParser`, `RuliwebParser`, `DcinsideParser`: board-specific markup
//! - `extract`: DOM helpers (text, counts, dates, link resolution, pagination)

mod dcinside;
pub mod extract;
mod generic;
mod inven;
mod registry;
mod ruliweb;
mod site;

use crate::model::{Comment, PostContent};
use crate::ParseError;
use url::Url;

pub use dcinside::DcinsideParser;
pub use generic::GenericParser;
pub use inven::InvenParser;
pub use registry::ParserRegistry;
pub use ruliweb::RuliwebParser;
pub use site::SiteRules;

/// A post link found on a board listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub url: String,
    pub title: String,
}

/// Extracts structured records from one site's markup
///
/// Site-specific implementations return [`ParseError`] when the page lacks
/// the structure they expect, so callers can fall back to the generic parser.
pub trait ContentParser: Send + Sync {
    /// Short identifier, also used as the post's `site`
    fn name(&self) -> &'static str;

    /// Domains this parser is registered for by default
    fn supported_domains(&self) -> &'static [&'static str];

    /// Parses a post page, including the comments shown on it
    fn parse_post(&self, html: &str, url: &Url, keyword: &str) -> Result<PostContent, ParseError>;

    /// Parses the comments on one page; no comment structure means no comments
    fn parse_comments(&self, html: &str) -> Vec<Comment>;

    /// Locates comment page `current_page + 1` of the post at `post_url`
    fn next_comment_page(&self, html: &str, post_url: &Url, current_page: u32) -> Option<Url> {
        extract::find_next_page(html, post_url, current_page)
    }

    /// Extracts post links from a board listing page
    fn parse_listing(&self, _html: &str, _base: &Url) -> Vec<ListingEntry> {
        Vec::new()
    }
}
