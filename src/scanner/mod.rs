//! Scanning a raw document for `<xtml>` tags.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches self-closing `<xtml … />` (group 1: attributes) or a block
/// `<xtml …> … </xtml>` (group 2: attributes, group 3: content). Block
/// matching is non-greedy, so the nearest closing tag wins; nested blocks
/// are not supported.
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<xtml\b([^>]*)/>|<xtml\b([^>]*)>([\s\S]*?)</xtml>")
        .expect("tag pattern must compile")
});

static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w-]+)\s*=\s*"([^"]*)""#).expect("attribute pattern must compile"));

/// One scanned tag, self-closing or block, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtmlTag {
    /// The full matched source, used to substitute the tag in the document.
    pub full: String,
    /// The opening tag including its attributes.
    pub head: String,
    /// The literal content between the opening and closing tag; empty for
    /// self-closing tags.
    pub content: String,
    pub self_closing: bool,
    pub attributes: HashMap<String, String>,
}

/// Find all `<xtml>` tags in a document.
pub fn find_tags(content: &str) -> Vec<XtmlTag> {
    let mut tags = vec![];

    for captures in TAG_RE.captures_iter(content) {
        let full = captures[0].to_owned();

        let tag = if let Some(attrs) = captures.get(1) {
            let head = format!("<xtml{}/>", attrs.as_str());
            XtmlTag {
                attributes: parse_attributes(&head),
                full,
                head,
                content: String::new(),
                self_closing: true,
            }
        } else {
            let head = format!("<xtml{}>", &captures[2]);
            XtmlTag {
                attributes: parse_attributes(&head),
                full,
                head,
                content: captures[3].to_owned(),
                self_closing: false,
            }
        };

        tags.push(tag);
    }

    tags
}

/// Parse `name="value"` attributes out of an opening tag. Values are always
/// double-quoted; names may contain word characters and dashes.
pub fn parse_attributes(head: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for captures in ATTR_RE.captures_iter(head) {
        attributes.insert(captures[1].to_owned(), captures[2].to_owned());
    }
    attributes
}
