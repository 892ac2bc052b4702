//! Link extraction and internal/external classification
//!
//! Collects the first `href` of every `<a>` element, in document order. Repeated
//! targets are kept: each occurrence is counted and checked.

use crate::markup::{walk, Document};
use crate::url::same_host;
use url::Url;

/// Prefixes of href values that never lead to a fetchable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "#"];

/// One outbound link discovered on the crawled page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Absolute URL after resolution against the page URL
    pub url: String,

    /// True if the link points at the crawled page's host
    pub is_internal: bool,
}

/// Extracts and classifies all anchor links in a document
///
/// # Filtering Rules
///
/// **Dropped:**
/// - empty or whitespace-only `href`
/// - `javascript:`, `mailto:`, `tel:` links
/// - fragment-only links (`#section`)
/// - values that cannot be parsed or resolved as a URL
///
/// Anything else (including other schemes such as `ftp:`) is kept and resolved
/// against `base_url`.
///
/// # Classification
///
/// A link is internal iff its host and port equal `base_url`'s exactly; `www.`
/// and non-`www.` hosts are different sites.
///
/// # Example
///
/// ```
/// use pagescope::crawler::extract_links;
/// use pagescope::markup::Document;
/// use url::Url;
///
/// let doc = Document::parse_str(r#"<a href="/about">About</a>"#);
/// let base = Url::parse("https://example.com/x/y").unwrap();
/// let links = extract_links(&doc, &base);
/// assert_eq!(links[0].url, "https://example.com/about");
/// assert!(links[0].is_internal);
/// ```
pub fn extract_links(document: &Document, base_url: &Url) -> Vec<LinkRecord> {
    let mut links = Vec::new();

    walk(document.root(), |node| {
        if !node.is("a") {
            return;
        }
        if let Some(link) = node.attr("href").and_then(|href| classify_link(href, base_url)) {
            links.push(link);
        }
    });

    tracing::debug!(
        "Extracted {} links ({} internal) from {}",
        links.len(),
        links.iter().filter(|l| l.is_internal).count(),
        base_url
    );

    links
}

/// Resolves and classifies one href value, or returns None if it is skipped
pub fn classify_link(href: &str, base_url: &Url) -> Option<LinkRecord> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if SKIPPED_PREFIXES.iter().any(|prefix| href.starts_with(prefix)) {
        return None;
    }

    // join() handles both absolute and relative references
    let resolved = base_url.join(href).ok()?;
    let is_internal = same_host(&resolved, base_url);

    Some(LinkRecord {
        url: resolved.to_string(),
        is_internal,
    })
}

/// URLs of the internal links, in discovery order, duplicates kept
pub fn internal_targets(links: &[LinkRecord]) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.is_internal)
        .map(|link| link.url.clone())
        .collect()
}
