use crate::model::{Comment, PostContent};
use crate::parsers::site::{self, SiteRules};
use crate::parsers::{ContentParser, ListingEntry};
use crate::ParseError;
use url::Url;

const RULES: SiteRules = SiteRules {
    name: "dcinside",
    domains: &[
        "dcinside.com",
        "www.dcinside.com",
        "m.dcinside.com",
        "gall.dcinside.com",
    ],
    title: &[
        ".gallview_head .title_subject",
        ".view_content_wrap .title",
        ".title_headtext + span",
        ".title_subject",
        "h3.title",
        ".gall_tit",
    ],
    title_fallback: "h3",
    strip_title_prefix: true,
    body: &[
        ".gallview_contents .inner .writing_view_box",
        ".write_div",
        ".view_content_wrap .content",
        ".gallery_re_content",
        ".thum_contents",
        ".view_main",
    ],
    body_noise: &[
        "[class*='banner']",
        "[class*='promotion']",
        "[class^='ad_']",
        ".ad",
    ],
    body_signatures: &["- dc official App", "- dc App"],
    author: &[
        ".gallview_head .nickname",
        ".gall_writer .nickname",
        ".fl .nickname",
        ".writer_info .nickname",
        ".user_info .nick",
    ],
    date: &[
        ".gallview_head .gall_date",
        ".gall_date",
        ".fl .date",
        ".writer_info .date",
        "time.date",
    ],
    views: &[
        ".gallview_head .gall_count",
        ".gall_count",
        ".view_info .hit",
        ".view_count",
    ],
    likes: &[
        ".gallview_head .gall_reply_num",
        ".gall_recommend",
        ".recommend_btn .up_num",
        ".btn_recommend_box .up_num",
        ".like_count",
    ],
    comment_items: &[
        ".reply_list .reply_item",
        ".comment_list .comment_item",
        "#comment_list li",
        ".cmt_list li",
        ".reply_box .reply",
    ],
    comment_deleted: &[".del_reply", ".deleted"],
    comment_author: &[".nickname", ".nick", ".writer", ".user_info", ".gall_writer"],
    comment_content: &[".reply_content", ".usertxt", ".comment_text", ".cmt_txt", ".reply_txt"],
    comment_meta: &[
        "[class*='nick']",
        "[class*='author']",
        "[class*='date']",
        "[class*='time']",
        "[class*='like']",
        "[class*='btn']",
        "[class*='del']",
    ],
    comment_date: &[".date_time", ".date", ".time", "time", ".reply_date"],
    comment_likes: &[".reply_num", ".like", ".recommend", ".vote", ".good"],
    listing: &["tr.ub-content td.gall_tit a"],
};

/// Parser for dcinside.com galleries
///
/// Gallery titles carry a `[말머리]` category tag, nicknames live in
/// `data-nick`, deleted comments stay in the markup, and mobile posts end
/// with an app signature; all of these are cleaned up.
#[derive(Debug, Default, Clone, Copy)]
pub struct DcinsideParser;

impl ContentParser for DcinsideParser {
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
