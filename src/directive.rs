//! Scanner for `<!-- #include file="..." -->` directives.

use regex::{CaptureMatches, Regex};
use std::sync::LazyLock;

/// Matches a complete include directive. The attribute value may not span
/// lines, so an unterminated `file="...` never swallows a later directive.
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--\s*#include\s+file\s*=\s*"([^"\r\n]*)"\s*-->"#).unwrap()
});

/// An include directive found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// The full comment, from `<!--` to `-->`
    pub full_match: &'a str,
    /// The referenced path exactly as written in the `file` attribute
    pub path: &'a str,
    /// Byte offset of the comment start in the parent text
    pub start: usize,
    /// Byte offset one past the comment end in the parent text
    pub end: usize,
    /// Position among the directives of the parent text, starting at zero
    pub ordinal: usize,
}

/// Lazy, left-to-right sequence of directives in a text.
///
/// Created by [`find_directives`].
pub struct Directives<'a> {
    captures: CaptureMatches<'static, 'a>,
    next_ordinal: usize,
}

impl<'a> Iterator for Directives<'a> {
    type Item = Directive<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let capture = self.captures.next()?;
        let full_match = capture.get(0)?;
        let path = capture.get(1)?;

        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;

        Some(Directive {
            full_match: full_match.as_str(),
            path: path.as_str(),
            start: full_match.start(),
            end: full_match.end(),
            ordinal,
        })
    }
}

/// Scans `text` for include directives.
///
/// Comments that lack the `#include` keyword or carry a missing or
/// unterminated `file` attribute are not directives and are skipped.
pub fn find_directives(text: &str) -> Directives<'_> {
    Directives {
        captures: DIRECTIVE_RE.captures_iter(text),
        next_ordinal: 0,
    }
}

/// Returns true if `text` contains at least one include directive
pub fn contains_directive(text: &str) -> bool {
    DIRECTIVE_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_directives_basic() {
        let text = r#"<a><!-- #include file="B.xml" --></a><!-- #include file="Wolf\단타.xml" -->"#;
        let found: Vec<_> = find_directives(text).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, "B.xml");
        assert_eq!(found[0].ordinal, 0);
        assert_eq!(found[0].full_match, r#"<!-- #include file="B.xml" -->"#);
        assert_eq!(&text[found[0].start..found[0].end], found[0].full_match);
        assert_eq!(found[1].path, r"Wolf\단타.xml");
        assert_eq!(found[1].ordinal, 1);
        assert_eq!(&text[found[1].start..found[1].end], found[1].full_match);
    }

    #[test]
    fn test_find_directives_whitespace_variants() {
        let text = "<!--#include file=\"a.xml\"-->\n<!--   #include   file = \"b.xml\"   -->";
        let paths: Vec<_> = find_directives(text).map(|d| d.path).collect();
        assert_eq!(paths, vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_find_directives_ignores_other_comments() {
        let text = r#"<!-- a note --><!-- include file="x.xml" --><!-- #includes file="y.xml" -->"#;
        assert_eq!(find_directives(text).count(), 0);
        assert!(!contains_directive(text));
    }

    #[test]
    fn test_find_directives_malformed() {
        // Missing attribute
        assert_eq!(find_directives("<!-- #include -->").count(), 0);

        // Unterminated attribute value
        assert_eq!(find_directives(r#"<!-- #include file="a.xml -->"#).count(), 0);

        // Unclosed comment
        assert_eq!(find_directives(r#"<!-- #include file="a.xml""#).count(), 0);

        // A broken directive does not swallow a following valid one
        let text = "<!-- #include file=\"a.xml -->\n<!-- #include file=\"b.xml\" -->";
        let found: Vec<_> = find_directives(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "b.xml");
        assert_eq!(found[0].ordinal, 0);
    }

    #[test]
    fn test_find_directives_empty_text() {
        assert_eq!(find_directives("").count(), 0);
        assert_eq!(find_directives("<root>plain</root>").count(), 0);
    }

    #[test]
    fn test_find_directives_is_lazy() {
        let text = r#"<!-- #include file="1.xml" --><!-- #include file="2.xml" -->"#;
        let mut directives = find_directives(text);
        assert_eq!(directives.next().map(|d| d.path), Some("1.xml"));
        assert_eq!(directives.next().map(|d| d.path), Some("2.xml"));
        assert_eq!(directives.next(), None);
    }
}
