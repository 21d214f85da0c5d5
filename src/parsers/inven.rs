use crate::model::{Comment, PostContent};
use crate::parsers::site::{self, SiteRules};
use crate::parsers::{ContentParser, ListingEntry};
use crate::ParseError;
use url::Url;

const RULES: SiteRules = SiteRules {
    name: "inven",
    domains: &["inven.co.kr", "www.inven.co.kr", "m.inven.co.kr"],
    title: &[
        ".articleTitle",
        ".article-head .title",
        ".contentBody .title",
        "h1.title",
        ".view-title",
        "#content .title",
    ],
    title_fallback: "h1",
    strip_title_prefix: false,
    body: &[
        ".articleContent",
        ".article-body",
        ".contentBody .content",
        "#content .content",
        ".view-content",
        ".postContent",
    ],
    body_noise: &[],
    body_signatures: &[],
    author: &[
        ".articleWriter",
        ".article-head .writer",
        ".nickname",
        ".author",
        ".user-name",
    ],
    date: &[".articleDate", ".article-head .date", ".regdate", ".date", "time"],
    views: &[".articleHit", ".hit", ".view-count", ".read"],
    likes: &[".articleLike", ".recommend", ".like-count", ".vote-up"],
    comment_items: &[
        ".comment-list .comment-item",
        ".commentList .comment",
        ".reply-list li",
        "#comment-list .comment",
        ".cmtList li",
    ],
    comment_deleted: &[],
    comment_author: &[".nickname", ".writer", ".author", ".name", ".user"],
    comment_content: &[".content", ".text", ".comment-text", ".body", ".reply-content"],
    comment_meta: &[
        "[class*='nick']",
        "[class*='author']",
        "[class*='date']",
        "[class*='time']",
        "[class*='like']",
    ],
    comment_date: &[".date", ".time", "time", ".regdate"],
    comment_likes: &[".like", ".recommend", ".vote", ".good"],
    listing: &["tr.ls-table-body td.tit a.subject-link", "tr.ls-table-body td.tit a"],
};

/// Parser for inven.co.kr boards
#[derive(Debug, Default, Clone, Copy)]
pub struct InvenParser;

impl ContentParser for InvenParser {
    fn name(&self) -> &'static str {
        RULES.name
    }

    fn supported_domains(&self) -> &'static [&'static str] {
        RULES.domains
    }

    fn parse_post(&self, html: &str, url: &Url, keyword: &str) -> Result<PostContent, ParseError> {
        site::parse_post(&RULES, html, url, keyword)
    }

    fn parse_comments(&self, html: &str) -> Vec<Comment> {
        site::parse_comments(&RULES, html)
    }

    fn parse_listing(&self, html: &str, base: &Url) -> Vec<ListingEntry> {
        site::parse_listing(&RULES, html, base)
    }
}
