use crate::model::{Comment, PostContent};
use crate::parsers::extract::{
    block_text, compile, first_author, first_count, first_date, first_text, inline_text,
    labelled_count, select_all, select_first, text_pieces,
};
use crate::parsers::ContentParser;
use crate::url::{extract_domain, site_label};
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const TITLE_SELECTORS: &[&str] = &[
    "h1.title",
    "h1.post-title",
    "h1.entry-title",
    "h1.article-title",
    ".title h1",
    ".post-title",
    ".entry-title",
    ".article-title",
    "article h1",
    ".content h1",
    "main h1",
    "h1",
    "title",
];

const BODY_SELECTORS: &[&str] = &[
    "article .content",
    "article .body",
    "article .post-content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".content-body",
    ".post-body",
    ".main-content",
    "article",
    "main",
    ".content",
    "#content",
];

/// Page chrome excluded from body text
const CHROME: &[&str] = &["nav", "header", "footer", "aside"];

const DATE_SELECTORS: &[&str] = &[
    "time[datetime]",
    ".date",
    ".post-date",
    ".entry-date",
    ".published",
    ".created",
    ".timestamp",
    ".meta-date",
];

const AUTHOR_SELECTORS: &[&str] = &[
    ".author",
    ".writer",
    ".nickname",
    ".username",
    ".post-author",
    ".entry-author",
    ".byline",
];

const VIEW_SELECTORS: &[&str] = &["[class*='view']", "[class*='hit']"];
const LIKE_SELECTORS: &[&str] = &["[class*='like']", "[class*='recommend']"];

const COMMENT_AREAS: &[&str] = &[
    ".comments",
    ".comment-list",
    "#comments",
    ".comment-area",
    ".reply-list",
    ".comment-wrap",
];

const COMMENT_ITEMS: &[&str] = &[".comment", ".comment-item", ".reply", ".reply-item"];

/// Body candidates this short are passed over for the next selector
const MIN_BODY_CHARS: usize = 50;

/// Heuristic parser for pages without a dedicated parser
///
/// Never fails: fields it cannot find are left empty, and pages without a
/// recognizable comment section have no comments. The post's `site` is the
/// community's short name for known hosts, otherwise the page's host.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericParser;

impl GenericParser {
    fn extract_body(root: ElementRef<'_>) -> String {
        let chrome = compile(CHROME);

        let candidate = compile(BODY_SELECTORS).iter().find_map(|selector| {
            let element = root.select(selector).next()?;
            let text = block_text(element, &chrome);
            (text.chars().count() > MIN_BODY_CHARS).then_some(text)
        });

        candidate.unwrap_or_else(|| {
            Selector::parse("body")
                .ok()
                .and_then(|body| root.select(&body).next())
                .map(|body| block_text(body, &chrome))
                .unwrap_or_default()
        })
    }

    fn parse_comment_item(item: ElementRef<'_>) -> Option<Comment> {
        let content = select_first(item, &[".content", ".text", ".body", ".comment-text"])
            .map(inline_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| {
                let meta = compile(&[
                    "[class*='author']",
                    "[class*='writer']",
                    "[class*='nick']",
                    "[class*='name']",
                    "[class*='date']",
                    "[class*='time']",
                    "[class*='like']",
                ]);
                text_pieces(item, &meta).join(" ")
            });
        if content.is_empty() {
            return None;
        }

        let author = first_author(item, &[".author", ".writer", ".nickname", ".name"])
            .unwrap_or_default();
        let mut comment = Comment::new(author, content);
        comment.created_at = first_date(item, &[".date", ".time", "time"]);
        comment.like_count = first_count(item, &[".like", ".recommend", ".vote"]).unwrap_or(0);
        Some(comment)
    }
}

impl ContentParser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn supported_domains(&self) -> &'static [&'static str] {
        &[]
    }

    fn parse_post(&self, html: &str, url: &Url, keyword: &str) -> Result<PostContent, ParseError> {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let site = extract_domain(url)
            .map(|host| site_label(&host))
            .unwrap_or_default();

        let mut post = PostContent::new(url.as_str(), site);
        post.keyword = keyword.to_string();
        post.title = first_text(root, TITLE_SELECTORS).unwrap_or_default();
        post.body = Self::extract_body(root);
        post.author = first_author(root, AUTHOR_SELECTORS);
        post.created_at = first_date(root, DATE_SELECTORS);

        let page_text = inline_text(root);
        post.view_count = first_count(root, VIEW_SELECTORS)
            .or_else(|| labelled_count(&page_text, "조회"))
            .unwrap_or(0);
        post.like_count = first_count(root, LIKE_SELECTORS)
            .or_else(|| labelled_count(&page_text, "추천"))
            .unwrap_or(0);
        post.comments = self.parse_comments(html);

        Ok(post)
    }

    fn parse_comments(&self, html: &str) -> Vec<Comment> {
        let document = Html::parse_document(html);
        let Some(area) = select_first(document.root_element(), COMMENT_AREAS) else {
            return Vec::new();
        };

        select_all(area, COMMENT_ITEMS)
            .into_iter()
            .filter_map(Self::parse_comment_item)
            .collect()
    }
}
