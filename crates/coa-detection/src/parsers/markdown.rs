//! Markdown declaration grammar
//!
//! ```text
//! ## ARTIFACT: <name>
//! - path: /abs/path
//! - type: report
//! - description: free text
//! ```
//!
//! pulldown-cmark finds the heading and list-item blocks; each block's value
//! is then read from its raw source slice, so `_`, `*` and other inline
//! markup in paths and descriptions are kept literally. A value wrapped in
//! one pair of backticks is unwrapped.

use super::{DeclarationFormat, DeclarationParser, RawDeclaration};
use pulldown_cmark::{Event, HeadingLevel, Parser as MdParser, Tag, TagEnd};

const HEADING_PREFIX: &str = "ARTIFACT:";

/// `## ARTIFACT:` section parser
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Name from an H2 heading text, if it is an artifact heading
fn artifact_heading(text: &str) -> Option<&str> {
    let text = text.trim();
    let head = text.get(..HEADING_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(HEADING_PREFIX) {
        return None;
    }
    Some(text[HEADING_PREFIX.len()..].trim())
}

/// Heading text from its source: ATX `#` markers stripped, setext underline dropped
fn heading_source(raw: &str) -> &str {
    let text = raw.lines().next().unwrap_or_default().trim();
    let text = text.trim_start_matches('#').trim();
    // A closing `#` run only counts when separated by a space.
    let closed = text.trim_end_matches('#');
    if closed.len() < text.len() && (closed.is_empty() || closed.ends_with(char::is_whitespace)) {
        closed.trim_end()
    } else {
        text
    }
}

/// Rest of `line` after a bullet or ordered-list marker, if it starts with one
fn after_marker(line: &str) -> Option<&str> {
    let rest = match line.strip_prefix(|c: char| matches!(c, '-' | '*' | '+')) {
        Some(rest) => rest,
        None => {
            let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }
            line[digits..].strip_prefix(|c: char| matches!(c, '.' | ')'))?
        }
    };
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

/// The `key: value` text of a list item, continuation lines joined by spaces
///
/// Stops at a blank line or a nested list marker.
fn item_source(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default().trim_start();
    let mut out = after_marker(first).unwrap_or(first).trim().to_string();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || after_marker(line).is_some() {
            break;
        }
        out.push(' ');
        out.push_str(line);
    }
    out
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('`')
        .and_then(|v| v.strip_suffix('`'))
        .filter(|v| !v.contains('`'))
        .unwrap_or(value)
}

impl DeclarationParser for MarkdownParser {
    fn format(&self) -> DeclarationFormat {
        DeclarationFormat::Markdown
    }

    fn parse(&self, text: &str) -> Vec<RawDeclaration> {
        let mut found = Vec::new();
        let mut current: Option<RawDeclaration> = None;
        let mut depth = 0usize;

        for (event, range) in MdParser::new(text).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    found.extend(current.take());
                    if level == HeadingLevel::H2 {
                        current = artifact_heading(heading_source(&text[range]))
                            .map(RawDeclaration::named);
                    }
                }
                Event::Start(Tag::Item) => {
                    depth += 1;
                    let Some(decl) = current.as_mut().filter(|_| depth == 1) else {
                        continue;
                    };
                    let line = item_source(&text[range]);
                    if let Some((key, value)) = line.split_once(':') {
                        decl.set(key.trim(), unquote(value));
                    }
                }
                Event::End(TagEnd::Item) => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        found.extend(current);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_declaration() {
        let text = "## ARTIFACT: X\n- path: /exec/out.txt\n- type: report\n- description: D";
        let found = MarkdownParser::new().parse(text);

        assert_eq!(
            found,
            vec![RawDeclaration {
                name: Some("X".to_string()),
                path: Some("/exec/out.txt".to_string()),
                artifact_type: Some("report".to_string()),
                description: Some("D".to_string()),
            }]
        );
    }

    #[test]
    fn parses_several_sections_amid_prose() {
        let text = "\
# Results

Some prose first.

## ARTIFACT: Prices
- Path: `/exec/prices.csv`
- Description: Daily *closing* prices

## Notes
- path: /exec/ignored.txt

## artifact: Chart
- path: /exec/chart.png
";
        let found = MarkdownParser::new().parse(text);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name.as_deref(), Some("Prices"));
        assert_eq!(found[0].path.as_deref(), Some("/exec/prices.csv"));
        assert_eq!(found[0].description.as_deref(), Some("Daily *closing* prices"));
        assert_eq!(found[1].name.as_deref(), Some("Chart"));
        assert_eq!(found[1].path.as_deref(), Some("/exec/chart.png"));
    }

    #[test]
    fn only_h2_headings_count() {
        let text = "### ARTIFACT: Deep\n- path: /exec/deep.txt\n";
        assert!(MarkdownParser::new().parse(text).is_empty());
    }

    #[test]
    fn description_may_contain_colons() {
        let text = "## ARTIFACT: T\n- path: /exec/t.txt\n- description: ratio: 3:1\n";
        let found = MarkdownParser::new().parse(text);
        assert_eq!(found[0].description.as_deref(), Some("ratio: 3:1"));
    }

    #[test]
    fn markup_characters_are_kept_literally() {
        let text = "\
## ARTIFACT: Init
- path: /exec/__init__.py
- type: code

## ARTIFACT: my_draft_v2_
- path: /exec/my_draft_v2_.md
- description: a *starred* note with `ticks` and __bold__
";
        let found = MarkdownParser::new().parse(text);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path.as_deref(), Some("/exec/__init__.py"));
        assert_eq!(found[0].artifact_type.as_deref(), Some("code"));
        assert_eq!(found[1].name.as_deref(), Some("my_draft_v2_"));
        assert_eq!(found[1].path.as_deref(), Some("/exec/my_draft_v2_.md"));
        assert_eq!(
            found[1].description.as_deref(),
            Some("a *starred* note with `ticks` and __bold__")
        );
    }

    #[test]
    fn heading_closing_hashes() {
        assert_eq!(heading_source("## ARTIFACT: X ##"), "ARTIFACT: X");
        assert_eq!(heading_source("## ARTIFACT: C#"), "ARTIFACT: C#");
        assert_eq!(heading_source("ARTIFACT: Setext\n---"), "ARTIFACT: Setext");
    }

    #[test]
    fn wrapped_and_nested_items() {
        let text = "\
## ARTIFACT: Long
* path: `/exec/a_b.txt`
* description: first line
  continues here
  - nested: ignored
1. type: report
";
        let found = MarkdownParser::new().parse(text);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.as_deref(), Some("/exec/a_b.txt"));
        assert_eq!(found[0].description.as_deref(), Some("first line continues here"));
        assert_eq!(found[0].artifact_type.as_deref(), Some("report"));
    }
}
