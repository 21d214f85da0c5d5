use crate::parsers::{ContentParser, DcinsideParser, GenericParser, InvenParser, RuliwebParser};
use crate::url::{best_match, domain_of};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Maps domains to content parsers
///
/// Lookups match the exact host first, then the longest registered domain
/// the host is a subdomain of, and otherwise return the generic parser.
/// The generic parser is created once, so every fallback lookup returns the
/// same instance.
pub struct ParserRegistry {
    parsers: RwLock<HashMap<String, Arc<dyn ContentParser>>>,
    generic: Arc<dyn ContentParser>,
}

impl ParserRegistry {
    /// Creates a registry with only the generic fallback
    pub fn new() -> Self {
        Self {
            parsers: RwLock::new(HashMap::new()),
            generic: Arc::new(GenericParser),
        }
    }

    /// Creates a registry with the built-in community site parsers
    pub fn with_default_parsers() -> Self {
        let registry = Self::new();
        registry.register_parser(Arc::new(InvenParser));
        registry.register_parser(Arc::new(RuliwebParser));
        registry.register_parser(Arc::new(DcinsideParser));
        registry
    }

    /// Associates `domain` with `parser`; the last registration for a domain wins
    pub fn register(&self, domain: &str, parser: Arc<dyn ContentParser>) {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return;
        }
        self.write().insert(domain, parser);
    }

    /// Registers a parser for every domain it supports
    pub fn register_parser(&self, parser: Arc<dyn ContentParser>) {
        for domain in parser.supported_domains() {
            self.register(domain, Arc::clone(&parser));
        }
    }

    /// Returns the parser for a URL or bare domain; never fails
    pub fn get_parser(&self, url_or_domain: &str) -> Arc<dyn ContentParser> {
        let Some(host) = domain_of(url_or_domain) else {
            return Arc::clone(&self.generic);
        };

        let parsers = self.read();
        if let Some(parser) = parsers.get(&host) {
            return Arc::clone(parser);
        }

        best_match(&host, parsers.keys().map(String::as_str))
            .and_then(|domain| parsers.get(domain))
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.generic))
    }

    /// The fallback parser used for unregistered hosts
    pub fn generic(&self) -> Arc<dyn ContentParser> {
        Arc::clone(&self.generic)
    }

    /// Returns true if `parser` is this registry's generic fallback
    pub fn is_generic(&self, parser: &Arc<dyn ContentParser>) -> bool {
        Arc::ptr_eq(parser, &self.generic)
    }

    /// Returns true if a non-generic parser handles the URL or domain
    pub fn has_parser_for(&self, url_or_domain: &str) -> bool {
        !self.is_generic(&self.get_parser(url_or_domain))
    }

    /// Registered domains, sorted
    pub fn registered_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.read().keys().cloned().collect();
        domains.sort();
        domains
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn ContentParser>>> {
        self.parsers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn ContentParser>>> {
        self.parsers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("domains", &self.registered_domains())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, PostContent};
    use crate::ParseError;
    use url::Url;

    struct NamedParser(&'static str);

    impl ContentParser for NamedParser {
        fn name(&self) -> &'static str {
            self.0
        }

        fn supported_domains(&self) -> &'static [&'static str] {
            &[]
        }

        fn parse_post(&self, _: &str, url: &Url, _: &str) -> Result<PostContent, ParseError> {
            Ok(PostContent::new(url.as_str(), self.0))
        }

        fn parse_comments(&self, _: &str) -> Vec<Comment> {
            Vec::new()
        }
    }

    #[test]
    fn test_default_parsers_by_url() {
        let registry = ParserRegistry::with_default_parsers();

        assert_eq!(registry.get_parser("https://www.inven.co.kr/board/1").name(), "inven");
        assert_eq!(
            registry.get_parser("https://bbs.ruliweb.com/community/board/300143").name(),
            "ruliweb"
        );
        assert_eq!(
            registry.get_parser("https://gall.dcinside.com/board/view/?id=x&no=1").name(),
            "dcinside"
        );
    }

    #[test]
    fn test_suffix_match_for_unlisted_subdomain() {
        let registry = ParserRegistry::with_default_parsers();
        assert_eq!(
            registry.get_parser("https://lostark.inven.co.kr/dataninfo").name(),
            "inven"
        );
    }

    #[test]
    fn test_unregistered_host_gets_same_generic_instance() {
        let registry = ParserRegistry::with_default_parsers();

        let first = registry.get_parser("https://example.org/a");
        let second = registry.get_parser("https://another.net/b");
        let garbage = registry.get_parser("");

        assert_eq!(first.name(), "generic");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &garbage));
        assert!(registry.is_generic(&first));
        assert!(!registry.has_parser_for("https://example.org/a"));
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ParserRegistry::new();
        registry.register("forum.example.org", Arc::new(NamedParser("first")));
        registry.register("forum.example.org", Arc::new(NamedParser("second")));

        assert_eq!(registry.get_parser("https://forum.example.org/t/1").name(), "second");
        assert_eq!(registry.registered_domains(), vec!["forum.example.org"]);
    }

    #[test]
    fn test_exact_match_beats_suffix() {
        let registry = ParserRegistry::new();
        registry.register("example.org", Arc::new(NamedParser("parent")));
        registry.register("m.example.org", Arc::new(NamedParser("mobile")));

        assert_eq!(registry.get_parser("https://m.example.org/").name(), "mobile");
        assert_eq!(registry.get_parser("https://www.example.org/").name(), "parent");
        assert_eq!(registry.get_parser("example.org").name(), "parent");
    }

    #[test]
    fn test_registration_does_not_leak_to_other_domains() {
        let registry = ParserRegistry::new();
        registry.register("example.org", Arc::new(NamedParser("parent")));
        assert_eq!(registry.get_parser("https://notexample.org/").name(), "generic");
    }
}
