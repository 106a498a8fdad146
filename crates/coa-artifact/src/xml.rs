//! Minimal XML writing helpers for the reference wire format

use std::fmt::Write;

/// Escape text for use in XML content or attribute values
///
/// Replaces `&`, `<`, `>`, `"` and `'` with their predefined entities.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse of [`escape`], also decoding numeric character references
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric(entity),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

/// Indented line writer
#[derive(Debug, Default)]
pub(crate) struct XmlWriter {
    buf: String,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Write one line at `depth` (two spaces per level)
    pub(crate) fn line(&mut self, depth: usize, content: &str) {
        for _ in 0..depth {
            self.buf.push_str("  ");
        }
        self.buf.push_str(content);
        self.buf.push('\n');
    }

    /// Write `<tag>escaped text</tag>` at `depth`
    pub(crate) fn text_element(&mut self, depth: usize, tag: &str, text: &str) {
        let mut line = String::new();
        let _ = write!(line, "<{tag}>{}</{tag}>", escape(text));
        self.line(depth, &line);
    }

    pub(crate) fn finish(mut self) -> String {
        if self.buf.ends_with('\n') {
            self.buf.pop();
        }
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(
            escape(r#"a & b < c > d "e" 'f'"#),
            "a &amp; b &lt; c &gt; d &quot;e&quot; &apos;f&apos;"
        );
    }

    #[test]
    fn unescape_reverses_escape() {
        let raw = r#"<tag attr="x"> & 'y'"#;
        assert_eq!(unescape(&escape(raw)), raw);
    }

    #[test]
    fn unescape_numeric_and_unknown() {
        assert_eq!(unescape("&#65;&#x42;"), "AB");
        assert_eq!(unescape("&bogus; & done"), "&bogus; & done");
    }

    #[test]
    fn writer_indents_and_trims_trailing_newline() {
        let mut w = XmlWriter::new();
        w.line(0, "<a>");
        w.text_element(1, "b", "x<y");
        w.line(0, "</a>");
        assert_eq!(w.finish(), "<a>\n  <b>x&lt;y</b>\n</a>");
    }
}
