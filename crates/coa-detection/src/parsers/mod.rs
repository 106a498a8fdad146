//! Artifact declaration grammars for generated text
//!
//! Three independent grammars, each a [`DeclarationParser`]:
//! - Markdown headings `## ARTIFACT: <name>` with `- key: value` bullets (pulldown-cmark)
//! - A JSON object carrying an `artifacts` array (serde_json)
//! - Tagged `<artifacts><artifact>...</artifact></artifacts>` blocks (regex)
//!
//! Parsers only extract raw candidates. Whether a candidate names a real
//! file inside the execution root is decided by the declaration detector.

mod json;
mod markdown;
mod tagged;

pub use json::StructuredParser;
pub use markdown::MarkdownParser;
pub use tagged::TaggedParser;

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Grammar a declaration was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationFormat {
    Markdown,
    Structured,
    Tagged,
}

impl Display for DeclarationFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Markdown => "markdown",
            Self::Structured => "structured",
            Self::Tagged => "tagged",
        })
    }
}

/// Unvalidated declaration as written in the text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDeclaration {
    pub name: Option<String>,
    pub path: Option<String>,
    pub artifact_type: Option<String>,
    pub description: Option<String>,
}

impl RawDeclaration {
    /// Declaration with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Assign a field by (lower-cased) key; unknown keys are ignored
    ///
    /// Blank values leave the field unset.
    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match key.trim().to_ascii_lowercase().as_str() {
            "path" | "file" | "file_path" => &mut self.path,
            "type" | "artifact_type" => &mut self.artifact_type,
            "description" => &mut self.description,
            "name" => &mut self.name,
            _ => return,
        };
        *slot = Some(value.to_string());
    }
}

/// One declaration grammar
pub trait DeclarationParser: Send + Sync + std::fmt::Debug {
    fn format(&self) -> DeclarationFormat;

    /// Extract every candidate declaration, in order of appearance
    ///
    /// Malformed input yields fewer (or no) candidates, never an error.
    fn parse(&self, text: &str) -> Vec<RawDeclaration>;
}

/// The built-in grammars in merge order: Markdown, Structured, Tagged
#[must_use]
pub fn default_parsers() -> Vec<Box<dyn DeclarationParser>> {
    vec![
        Box::new(MarkdownParser::new()),
        Box::new(StructuredParser::new()),
        Box::new(TaggedParser::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_lowercases_keys_and_ignores_unknown() {
        let mut raw = RawDeclaration::named("X");
        raw.set("PATH", " /exec/out.txt ");
        raw.set("Type", "report");
        raw.set("owner", "me");
        raw.set("description", "   ");

        assert_eq!(raw.path.as_deref(), Some("/exec/out.txt"));
        assert_eq!(raw.artifact_type.as_deref(), Some("report"));
        assert_eq!(raw.description, None);
    }

    #[test]
    fn default_order() {
        let formats: Vec<_> = default_parsers().iter().map(|p| p.format()).collect();
        assert_eq!(
            formats,
            vec![
                DeclarationFormat::Markdown,
                DeclarationFormat::Structured,
                DeclarationFormat::Tagged
            ]
        );
    }

    #[test]
    fn same_declaration_in_all_three_grammars() {
        let text = r#"
## ARTIFACT: Summary
- path: /exec/summary.md
- type: report

```json
{"artifacts": [{"path": "/exec/summary.md", "type": "report"}]}
```

<artifact><path>/exec/summary.md</path><type>report</type></artifact>
"#;
        for parser in default_parsers() {
            let found = parser.parse(text);
            assert_eq!(found.len(), 1, "{}", parser.format());
            assert_eq!(found[0].path.as_deref(), Some("/exec/summary.md"));
            assert_eq!(found[0].artifact_type.as_deref(), Some("report"));
        }
    }
}
