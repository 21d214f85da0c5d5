//! Records produced by the acquisition pipeline
//!
//! These are the only types handed to downstream consumers (persistence,
//! export, analytics). They serialize with serde so callers can write them
//! in whatever format they choose.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Author name used when a comment carries none
pub const ANONYMOUS_AUTHOR: &str = "익명";

/// A candidate post discovered by a search adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// Relevance in [0, 1], assigned before results are surfaced
    pub relevance_score: f64,
}

impl SearchResult {
    /// Creates an unscored result
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
            relevance_score: 0.0,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.relevance_score = score.clamp(0.0, 1.0);
        self
    }
}

/// One comment under a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub created_at: Option<NaiveDateTime>,
    pub like_count: u64,
}

impl Comment {
    /// Creates a comment, substituting the anonymous placeholder for a blank author
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        let author = author.into();
        let author = if author.trim().is_empty() {
            ANONYMOUS_AUTHOR.to_string()
        } else {
            author.trim().to_string()
        };
        Self {
            author,
            content: content.into(),
            created_at: None,
            like_count: 0,
        }
    }
}

/// A fetched post together with its comment thread
///
/// `comments` only ever holds comments scraped from pages of this post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    pub url: String,
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub view_count: u64,
    pub like_count: u64,
    /// Short identifier of the site, e.g. `inven` or the host for generic pages
    pub site: String,
    /// Keyword whose search discovered this post
    pub keyword: String,
    pub comments: Vec<Comment>,
}

impl PostContent {
    /// Creates an empty post for the given URL and site
    pub fn new(url: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            body: String::new(),
            author: None,
            created_at: None,
            view_count: 0,
            like_count: 0,
            site: site.into(),
            keyword: String::new(),
            comments: Vec::new(),
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}
