//! Markup parsing and tree traversal
//!
//! `Document` wraps the html5ever-based tree produced by `scraper`. The rest of
//! the crate only sees `Node` handles and the `walk` traversal, never the parser
//! types, so every extractor is written against one small surface:
//!
//! - `Document::parse` never fails; malformed markup yields a best-effort tree
//! - `walk` visits a node and then its descendants, depth-first, pre-order, in
//!   document order

use ego_tree::iter::Edge;
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node as HtmlNode};

/// A parsed HTML document together with the text it was parsed from
pub struct Document {
    html: Html,
    source: String,
}

impl Document {
    /// Parses raw response bytes
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected, and the parser
    /// recovers from unbalanced or unknown tags the same way browsers do.
    pub fn parse(bytes: &[u8]) -> Self {
        Self::parse_str(&String::from_utf8_lossy(bytes))
    }

    /// Parses an already-decoded string
    pub fn parse_str(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            source: source.to_string(),
        }
    }

    /// The decoded text the tree was built from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The document node at the top of the tree
    pub fn root(&self) -> Node<'_> {
        Node {
            inner: self.html.tree.root(),
        }
    }
}

/// Broad classification of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Other,
}

/// A lightweight, copyable handle to one node of a `Document`
#[derive(Clone, Copy)]
pub struct Node<'a> {
    inner: NodeRef<'a, HtmlNode>,
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match self.inner.value() {
            HtmlNode::Document | HtmlNode::Fragment => NodeKind::Document,
            HtmlNode::Element(_) => NodeKind::Element,
            HtmlNode::Text(_) => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Lower-case tag name, or None for non-element nodes
    pub fn tag_name(&self) -> Option<&'a str> {
        self.inner.value().as_element().map(|e| e.name())
    }

    /// Returns true if this is an element with the given (lower-case) tag name
    pub fn is(&self, tag: &str) -> bool {
        self.tag_name() == Some(tag)
    }

    /// Value of an attribute; attribute names are lower-cased by the parser and
    /// only the first occurrence of a repeated attribute is kept
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().as_element().and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Text of this node if it is a text node
    pub fn text(&self) -> Option<&'a str> {
        self.inner.value().as_text().map(|t| &**t)
    }

    /// Text of the first child, if that child is a text node
    ///
    /// This is the "direct text" of an element such as `<title>` or `<button>`;
    /// text nested deeper (e.g. inside a `<span>`) is not included.
    pub fn first_text_child(&self) -> Option<&'a str> {
        self.inner
            .first_child()
            .and_then(|child| child.value().as_text())
            .map(|t| &**t)
    }

    /// Serialized markup of this element including its own tag
    pub fn outer_html(&self) -> String {
        match ElementRef::wrap(self.inner) {
            Some(element) => element.html(),
            None => self.text().unwrap_or_default().to_string(),
        }
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("tag", &self.tag_name())
            .finish()
    }
}

/// Visits `node` and every descendant, depth-first, pre-order
///
/// Each node is visited before its children; siblings are visited in document
/// order. Iterative, so deeply nested markup cannot exhaust the stack.
pub fn walk<'a, F>(node: Node<'a>, mut visit: F)
where
    F: FnMut(Node<'a>),
{
    for edge in node.inner.traverse() {
        if let Edge::Open(inner) = edge {
            visit(Node { inner });
        }
    }
}
