use crate::model::{Comment, PostContent};
use crate::parsers::site::{self, SiteRules};
use crate::parsers::{ContentParser, ListingEntry};
use crate::ParseError;
use url::Url;

const RULES: SiteRules = SiteRules {
    name: "ruliweb",
    domains: &["ruliweb.com", "www.ruliweb.com", "m.ruliweb.com", "bbs.ruliweb.com"],
    title: &[
        ".board_main .subject_text",
        ".board_main_top .subject",
        ".view_title .subject",
        "h1.subject",
        ".article_title",
        ".subject_inner_text",
    ],
    title_fallback: "h1",
    strip_title_prefix: false,
    body: &[
        ".board_main .view_content",
        ".board_main_view .content",
        ".article_content",
        ".view_content",
        "#content .content",
        ".source_url + div",
    ],
    body_noise: &[],
    body_signatures: &[],
    author: &[
        ".board_main .user_info .nick",
        ".board_main_top .nick",
        ".user_view .nick",
        ".writer .nick",
        ".nickname",
    ],
    date: &[
        ".board_main .regdate",
        ".board_main_top .regdate",
        ".user_view .regdate",
        ".article_info .date",
        "time.date",
    ],
    views: &[
        ".board_main .hit",
        ".board_main_top .hit",
        ".article_info .hit",
        ".view_count",
        ".read_count",
    ],
    likes: &[
        ".board_main .like",
        ".recommend_btn .like_value",
        ".article_info .recommend",
        ".like_count",
        ".vote_up",
    ],
    comment_items: &[
        ".comment_view .comment_element",
        ".comment_list .comment_item",
        ".reply_list .reply_item",
        "#comment .comment_element",
        ".board_comment .comment",
    ],
    comment_deleted: &[],
    comment_author: &[".nick", ".nickname", ".writer", ".author", ".user_info"],
    comment_content: &[".text", ".content", ".comment_content", ".reply_content", ".comment_text"],
    comment_meta: &[
        "[class*='nick']",
        "[class*='author']",
        "[class*='date']",
        "[class*='time']",
        "[class*='like']",
        "[class*='btn']",
    ],
    comment_date: &[".date", ".time", "time", ".regdate", ".comment_date"],
    comment_likes: &[".like", ".recommend", ".vote", ".good", ".like_count"],
    listing: &["tr.table_body td.subject a.deco"],
};

/// Parser for ruliweb.com boards
#[derive(Debug, Default, Clone, Copy)]
pub struct RuliwebParser;

impl ContentParser for RuliwebParser {
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
