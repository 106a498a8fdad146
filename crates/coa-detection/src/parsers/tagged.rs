//! Tagged declaration grammar
//!
//! ```text
//! <artifacts>
//!   <artifact name="optional">
//!     <path>/abs/path</path>
//!     <type>report</type>
//!     <description>free text</description>
//!   </artifact>
//! </artifacts>
//! ```
//!
//! Generated text is rarely well-formed XML, so this is a tolerant
//! regex-based reader. Blocks may be embedded in prose, and bare `<artifact>`
//! elements without the outer wrapper are wrapped before parsing.

use super::{DeclarationFormat, DeclarationParser, RawDeclaration};
use coa_artifact::xml::unescape;
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<artifacts\b[^>]*>(.*?)</artifacts\s*>").expect("valid block regex")
});

static ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<artifact\b([^>]*)>(.*?)</artifact\s*>").expect("valid element regex")
});

static CHILD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(path|type|description|name)\s*>(.*?)</(?:path|type|description|name)\s*>")
        .expect("valid child regex")
});

static NAME_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bname\s*=\s*"([^"]*)""#).expect("valid attribute regex"));

/// `<artifacts>` block parser
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedParser;

impl TaggedParser {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Wrap bare `<artifact>` elements in an `<artifacts>` block
fn synthesize_wrapper(text: &str) -> Option<String> {
    let elements: Vec<&str> = ELEMENT.find_iter(text).map(|m| m.as_str()).collect();
    if elements.is_empty() {
        return None;
    }
    Some(format!("<artifacts>\n{}\n</artifacts>", elements.join("\n")))
}

fn parse_element(attrs: &str, body: &str) -> RawDeclaration {
    let mut raw = RawDeclaration::default();
    if let Some(name) = NAME_ATTR.captures(attrs).and_then(|c| c.get(1)) {
        raw.set("name", &unescape(name.as_str()));
    }
    for child in CHILD.captures_iter(body) {
        if let (Some(tag), Some(value)) = (child.get(1), child.get(2)) {
            raw.set(tag.as_str(), &unescape(value.as_str()));
        }
    }
    raw
}

impl DeclarationParser for TaggedParser {
    fn format(&self) -> DeclarationFormat {
        DeclarationFormat::Tagged
    }

    fn parse(&self, text: &str) -> Vec<RawDeclaration> {
        let synthesized;
        let source = if BLOCK.is_match(text) {
            text
        } else {
            let Some(wrapped) = synthesize_wrapper(text) else {
                return Vec::new();
            };
            synthesized = wrapped;
            synthesized.as_str()
        };

        let mut found = Vec::new();
        for block in BLOCK.captures_iter(source) {
            let Some(inner) = block.get(1) else { continue };
            for element in ELEMENT.captures_iter(inner.as_str()) {
                let attrs = element.get(1).map_or("", |m| m.as_str());
                let body = element.get(2).map_or("", |m| m.as_str());
                found.push(parse_element(attrs, body));
            }
        }
        found
    }
}
