//! Crawler module for single-page crawl jobs
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of the crawled page
//! - Page profile, link and login-form extraction from one parsed tree
//! - Concurrent link health checks
//! - The cross-crawl internal link graph
//! - Overall job coordination

mod coordinator;
mod fetcher;
pub mod graph;
mod health;
mod links;
mod login;
mod profile;

pub use coordinator::{analyze_document, Coordinator, CrawlOutcome, PageAnalysis};
pub use fetcher::{build_http_client, fetch_document, FetchedDocument, MAX_REDIRECTS};
pub use health::{check_links, probe_link, BrokenLinkInfo, HttpProbe, LinkHealth, LinkProbe};
pub use links::{classify_link, extract_links, internal_targets, LinkRecord};
pub use login::has_login_form;
pub use profile::{clip_snippet, detect_html_version, extract_profile, PageProfile, SNIPPET_LIMIT};
