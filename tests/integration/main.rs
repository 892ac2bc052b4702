//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive crawl jobs
//! end-to-end through the coordinator.

mod common;
mod crawl_tests;
mod graph_tests;
mod lifecycle_tests;
