//! Page profile extraction
//!
//! One pass over the parsed tree collects the title, heading counts, meta tags,
//! canonical URL, images without alt text, and structured-data markers (JSON-LD,
//! Microdata, RDFa). The HTML version is classified separately from the raw text.

use crate::markup::{walk, Document, Node};
use serde::{Deserialize, Serialize};

/// Longest structured-data snippet kept, in characters, before the ellipsis
pub const SNIPPET_LIMIT: usize = 500;

const ELLIPSIS: &str = "...";

/// Structured profile of one crawled page
///
/// Link counts and the login-form flag are filled in by the crawl after the
/// link and login passes; `extract_profile` leaves them at zero/false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProfile {
    pub html_version: String,
    pub page_title: String,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub has_login_form: bool,
    pub meta_title: String,
    pub meta_description: String,
    pub canonical: String,
    pub images_missing_alt: Vec<String>,
    pub has_jsonld: bool,
    pub has_microdata: bool,
    pub has_rdfa: bool,
    pub jsonld_snippet: String,
    pub microdata_snippet: String,
    pub rdfa_snippet: String,
}

impl PageProfile {
    /// Heading counts h1..h6 as an array
    pub fn heading_counts(&self) -> [u32; 6] {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
    }
}

/// Extracts the page profile from a parsed document
///
/// # Extraction Rules
///
/// | Element | Rule |
/// |---------|------|
/// | `title` | first occurrence, trimmed |
/// | `h1`..`h6` | counted per level |
/// | `meta` | `og:description` / `og:title` always win; `name=description` / `name=title` only fill empty fields |
/// | `link rel~canonical` | `href`, last match wins |
/// | `img` | `src` (or first `srcset` token) recorded when `alt` is blank |
/// | `script type=application/ld+json` | JSON-LD; text of the first block |
/// | `itemscope` / `itemtype` / `itemprop` | Microdata; outer HTML of the last match |
/// | `vocab` / `typeof` / `property` | RDFa; outer HTML of the last match |
pub fn extract_profile(document: &Document) -> PageProfile {
    let mut profile = PageProfile {
        html_version: detect_html_version(document.source()).to_string(),
        ..PageProfile::default()
    };

    let mut title: Option<String> = None;
    let mut jsonld: Option<String> = None;

    walk(document.root(), |node| {
        let Some(tag) = node.tag_name() else {
            return;
        };

        match tag {
            "title" => {
                if title.is_none() {
                    if let Some(text) = node.first_text_child() {
                        title = Some(text.trim().to_string());
                    }
                }
            }
            "h1" => profile.h1_count += 1,
            "h2" => profile.h2_count += 1,
            "h3" => profile.h3_count += 1,
            "h4" => profile.h4_count += 1,
            "h5" => profile.h5_count += 1,
            "h6" => profile.h6_count += 1,
            "meta" => apply_meta(&node, &mut profile),
            "link" => {
                let rel = node.attr("rel").unwrap_or_default().to_lowercase();
                if rel.contains("canonical") {
                    profile.canonical = node.attr("href").unwrap_or_default().to_string();
                }
            }
            "img" => {
                if let Some(src) = image_missing_alt(&node) {
                    profile.images_missing_alt.push(src);
                }
            }
            "script" => {
                let kind = node.attr("type").unwrap_or_default().to_lowercase();
                if kind == "application/ld+json" {
                    profile.has_jsonld = true;
                    if jsonld.is_none() {
                        jsonld = node.first_text_child().map(str::to_string);
                    }
                }
            }
            _ => {}
        }

        if ["itemscope", "itemtype", "itemprop"]
            .iter()
            .any(|attr| node.has_attr(attr))
        {
            profile.has_microdata = true;
            profile.microdata_snippet = node.outer_html();
        }

        if ["vocab", "typeof", "property"]
            .iter()
            .any(|attr| node.has_attr(attr))
        {
            profile.has_rdfa = true;
            profile.rdfa_snippet = node.outer_html();
        }
    });

    profile.page_title = title.unwrap_or_default();
    profile.jsonld_snippet = clip_snippet(&jsonld.unwrap_or_default());
    profile.microdata_snippet = clip_snippet(&profile.microdata_snippet);
    profile.rdfa_snippet = clip_snippet(&profile.rdfa_snippet);

    tracing::debug!(
        title = %profile.page_title,
        meta_title = %profile.meta_title,
        canonical = %profile.canonical,
        missing_alt = profile.images_missing_alt.len(),
        "Extracted page profile"
    );

    profile
}

fn apply_meta(node: &Node<'_>, profile: &mut PageProfile) {
    let name = node.attr("name").unwrap_or_default().to_lowercase();
    let property = node.attr("property").unwrap_or_default().to_lowercase();
    let content = node.attr("content").unwrap_or_default();

    if property == "og:description" {
        profile.meta_description = content.to_string();
    } else if name == "description" && profile.meta_description.is_empty() {
        profile.meta_description = content.to_string();
    }

    if property == "og:title" {
        profile.meta_title = content.to_string();
    } else if name == "title" && profile.meta_title.is_empty() {
        profile.meta_title = content.to_string();
    }
}

/// Returns the image source if the image has no usable alt text
fn image_missing_alt(node: &Node<'_>) -> Option<String> {
    let mut src = node.attr("src").unwrap_or_default();
    if src.is_empty() {
        src = node
            .attr("srcset")
            .and_then(|srcset| srcset.split_whitespace().next())
            .unwrap_or_default();
    }

    let alt = node.attr("alt").unwrap_or_default().trim();
    if alt.is_empty() && !src.is_empty() {
        Some(src.to_string())
    } else {
        None
    }
}

/// Clips a snippet to `SNIPPET_LIMIT` characters, appending `...` when cut
pub fn clip_snippet(snippet: &str) -> String {
    if snippet.chars().count() <= SNIPPET_LIMIT {
        return snippet.to_string();
    }

    let mut clipped: String = snippet.chars().take(SNIPPET_LIMIT).collect();
    clipped.push_str(ELLIPSIS);
    clipped
}

/// Best-effort HTML version label from the raw document text
///
/// This is a substring heuristic over the whole (case-folded) text, not a
/// DOCTYPE parser: a page that merely mentions "xhtml" in its body without an
/// HTML5 doctype is reported as XHTML. Checked in priority order; anything
/// unrecognized is reported as HTML5.
pub fn detect_html_version(raw: &str) -> &'static str {
    let text = raw.to_lowercase();

    if text.contains("<!doctype html>") {
        return "HTML5";
    }

    if text.contains("xhtml") {
        if text.contains("1.1") {
            return "XHTML 1.1";
        }
        if text.contains("1.0") {
            return variant_label(
                &text,
                [
                    "XHTML 1.0 Strict",
                    "XHTML 1.0 Transitional",
                    "XHTML 1.0 Frameset",
                    "XHTML 1.0",
                ],
            );
        }
        return "XHTML";
    }

    if text.contains("html 4.01") {
        return variant_label(
            &text,
            [
                "HTML 4.01 Strict",
                "HTML 4.01 Transitional",
                "HTML 4.01 Frameset",
                "HTML 4.01",
            ],
        );
    }

    if text.contains("html 3.2") {
        return "HTML 3.2";
    }
    if text.contains("html 2.0") {
        return "HTML 2.0";
    }

    "HTML5"
}

/// Picks strict / transitional / frameset / plain, in that order
fn variant_label(text: &str, labels: [&'static str; 4]) -> &'static str {
    if text.contains("strict") {
        labels[0]
    } else if text.contains("transitional") {
        labels[1]
    } else if text.contains("frameset") {
        labels[2]
    } else {
        labels[3]
    }
}
