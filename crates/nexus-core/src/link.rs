//! Link extraction for report text.
//!
//! Splits free-form text into literal runs and `http://` / `https://` links so
//! views can render the links as activatable references while showing every
//! other character verbatim.

use serde::Serialize;

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// A piece of report text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TextSegment {
    /// Text shown as-is.
    Literal(String),
    /// A URL token.
    Link(String),
}

impl TextSegment {
    /// Raw text of the segment, exactly as it appeared in the input.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Link(text) => text,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

/// Split `text` into literal and link segments, in input order.
///
/// A link is `http://` or `https://` (case-sensitive, may begin mid-word)
/// followed by at least one non-whitespace character; it runs until the next
/// whitespace character or the end of the text. Empty literals are never
/// produced, so empty input yields no segments.
pub fn segment(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut literal_start = 0;

    while let Some(offset) = find_link_start(&text[literal_start..]) {
        let start = literal_start + offset;
        let end = text[start..]
            .find(char::is_whitespace)
            .map_or(text.len(), |len| start + len);

        if start > literal_start {
            segments.push(TextSegment::Literal(text[literal_start..start].to_string()));
        }
        segments.push(TextSegment::Link(text[start..end].to_string()));
        literal_start = end;
    }

    if literal_start < text.len() {
        segments.push(TextSegment::Literal(text[literal_start..].to_string()));
    }

    segments
}

/// Byte offset of the first link in `haystack`, if any.
fn find_link_start(haystack: &str) -> Option<usize> {
    haystack.match_indices("http").find_map(|(idx, _)| {
        let rest = &haystack[idx..];
        let scheme = SCHEMES.iter().find(|scheme| rest.starts_with(*scheme))?;
        let first = rest[scheme.len()..].chars().next()?;
        (!first.is_whitespace()).then_some(idx)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use TextSegment::{Link, Literal};

    fn lit(s: &str) -> TextSegment {
        Literal(s.to_string())
    }

    fn link(s: &str) -> TextSegment {
        Link(s.to_string())
    }

    fn joined(segments: &[TextSegment]) -> String {
        segments.iter().map(TextSegment::as_str).collect()
    }

    #[test]
    fn test_two_links_in_sentence() {
        let text = "See https://a.example/x and https://b.example/y for details";
        assert_eq!(
            segment(text),
            vec![
                lit("See "),
                link("https://a.example/x"),
                lit(" and "),
                link("https://b.example/y"),
                lit(" for details"),
            ]
        );
    }

    #[test]
    fn test_no_links() {
        let text = "Analysis of 'AI':\n• Trend 1: adoption is accelerating.";
        assert_eq!(segment(text), vec![lit(text)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_link_at_edges() {
        assert_eq!(
            segment("http://start.test middle https://end.test"),
            vec![
                link("http://start.test"),
                lit(" middle "),
                link("https://end.test"),
            ]
        );
        assert_eq!(segment("https://only.test"), vec![link("https://only.test")]);
    }

    #[test]
    fn test_adjacent_links_separated_by_whitespace() {
        assert_eq!(
            segment("https://a.test\n\thttps://b.test"),
            vec![link("https://a.test"), lit("\n\t"), link("https://b.test")]
        );
    }

    #[test]
    fn test_link_keeps_trailing_punctuation_until_whitespace() {
        assert_eq!(
            segment("(see https://x.test/r?q=a%20b).\nNext"),
            vec![
                lit("(see "),
                link("https://x.test/r?q=a%20b)."),
                lit("\nNext"),
            ]
        );
    }

    #[test]
    fn test_scheme_without_body_is_literal() {
        let text = "bare http:// and https://\nand http";
        assert_eq!(segment(text), vec![lit(text)]);
    }

    #[test]
    fn test_link_starting_mid_word() {
        assert_eq!(
            segment("ref:https://x.test"),
            vec![lit("ref:"), link("https://x.test")]
        );
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        let text = "HTTPS://shout.test";
        assert_eq!(segment(text), vec![lit(text)]);
    }

    #[test]
    fn test_unicode_around_links() {
        let text = "• Google Search: https://www.google.com/search?q=AI%20agriculture\n• Wikipédia — ok";
        let segments = segment(text);
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[1],
            link("https://www.google.com/search?q=AI%20agriculture")
        );
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let inputs = [
            "",
            " ",
            "plain",
            "https://a.test",
            "xhttps://a.test y",
            "http://a.test  http://b.test\n",
            "http:// https://ok.test http",
            "📢 **SUMMARY**\n\n### 🔗 References\n• https://en.wikipedia.org/wiki/Special:Search?search=AI",
            "httphttps://a.test https://https://b.test",
        ];
        for input in inputs {
            let segments = segment(input);
            assert_eq!(joined(&segments), input, "{input:?}");
            assert!(segments.iter().all(|s| !s.as_str().is_empty()), "{input:?}");
        }
    }
}
