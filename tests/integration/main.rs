//! Integration tests for Community-Harvest
//!
//! In-memory fetchers and adapters drive the pipeline end-to-end; wiremock
//! servers exercise the real HTTP path through `ReqwestFetcher`.

mod common;
mod content_tests;
mod crawl_tests;
mod search_tests;
