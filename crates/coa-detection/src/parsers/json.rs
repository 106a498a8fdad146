//! Structured (JSON) declaration grammar
//!
//! Finds the first JSON object in the text that carries an `artifacts`
//! array. The object may sit inside prose or a fenced code block. Scanning
//! starts at each `{`; serde_json's stream deserializer stops at the end of
//! the first complete value, and the scan resumes after that value, so every
//! byte is parsed as part of at most one successful value.

use super::{DeclarationFormat, DeclarationParser, RawDeclaration};
use serde_json::{Deserializer, Map, Value};

/// `{"artifacts": [...]}` parser
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredParser;

impl StructuredParser {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn declaration_from(entry: &Map<String, Value>) -> RawDeclaration {
    let mut raw = RawDeclaration::default();
    for (key, value) in entry {
        if let Value::String(s) = value {
            raw.set(key, s);
        }
    }
    raw
}

/// Failed parse attempts tolerated before the scan gives up
const MAX_FAILED_ATTEMPTS: usize = 256;

/// Depth-first search of a parsed value for an `artifacts` array
fn manifest_in(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Object(mut object) => match object.remove("artifacts") {
            Some(Value::Array(items)) => Some(items),
            other => other
                .into_iter()
                .chain(object.into_iter().map(|(_, v)| v))
                .find_map(manifest_in),
        },
        Value::Array(items) => items.into_iter().find_map(manifest_in),
        _ => None,
    }
}

/// First embedded object with an `artifacts` array
fn find_manifest(text: &str) -> Option<Vec<Value>> {
    let mut cursor = 0;
    let mut failed = 0;
    while let Some(offset) = text[cursor..].find('{') {
        let start = cursor + offset;
        let mut stream = Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                if let Some(items) = manifest_in(value) {
                    return Some(items);
                }
                cursor = start + stream.byte_offset().max(1);
            }
            _ => {
                failed += 1;
                if failed >= MAX_FAILED_ATTEMPTS {
                    tracing::debug!(failed, "giving up on structured declarations");
                    return None;
                }
                cursor = start + 1;
            }
        }
    }
    None
}

impl DeclarationParser for StructuredParser {
    fn format(&self) -> DeclarationFormat {
        DeclarationFormat::Structured
    }

    fn parse(&self, text: &str) -> Vec<RawDeclaration> {
        let Some(items) = find_manifest(text) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(Value::as_object)
            .map(declaration_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_manifest() {
        let text = r#"Done. Here is the manifest:
{"status": "ok", "artifacts": [
  {"path": "/exec/a.csv", "type": "data_fetch", "description": "raw"},
  {"path": "/exec/b.png"},
  "not an object",
  {"type": "report"}
]}
Thanks!"#;
        let found = StructuredParser::new().parse(text);

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].path.as_deref(), Some("/exec/a.csv"));
        assert_eq!(found[0].artifact_type.as_deref(), Some("data_fetch"));
        assert_eq!(found[0].description.as_deref(), Some("raw"));
        assert_eq!(found[1].path.as_deref(), Some("/exec/b.png"));
        assert_eq!(found[2].path, None);
    }

    #[test]
    fn skips_objects_without_artifacts() {
        let text = r#"{"config": {"artifacts": [{"path": "/exec/inner.txt"}]}}"#;
        let found = StructuredParser::new().parse(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.as_deref(), Some("/exec/inner.txt"));
    }

    #[test]
    fn manifest_inside_unclosed_wrapper_is_found() {
        let mut text = String::from("{\"log\": [");
        for i in 0..2000 {
            text.push_str(&format!("{{\"step\": {i}}}, "));
        }
        text.push_str(r#"{"artifacts": [{"path": "/exec/late.csv"}]}"#);
        // The wrapper is never closed, so only the inner values parse.
        let found = StructuredParser::new().parse(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.as_deref(), Some("/exec/late.csv"));
    }

    #[test]
    fn stray_braces_in_prose_are_skipped() {
        let mut text = "Set {x} then {y}. ".repeat(50);
        text.push_str(r#"{"artifacts": [{"path": "/exec/ok.txt"}]}"#);
        let found = StructuredParser::new().parse(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.as_deref(), Some("/exec/ok.txt"));
    }

    #[test]
    fn endless_stray_braces_give_up() {
        let mut text = "{ ".repeat(MAX_FAILED_ATTEMPTS + 1);
        text.push_str(r#"{"artifacts": [{"path": "/exec/too_late.txt"}]}"#);
        assert!(StructuredParser::new().parse(&text).is_empty());
    }

    #[test]
    fn malformed_json_yields_nothing() {
        assert!(StructuredParser::new().parse(r#"{"artifacts": [ {"path": "#).is_empty());
        assert!(StructuredParser::new().parse("no braces here").is_empty());
    }
}
