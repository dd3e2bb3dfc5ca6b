//! Recursive include expansion.
//!
//! A document is expanded by replacing each directive, left to right, with
//! the expanded text of the document it references. The chain of documents
//! currently being expanded is tracked so a reference back into the chain is
//! cut off instead of recursing forever.

use crate::directive::{contains_directive, find_directives};
use crate::error::{CompilerError, Result};
use crate::report::{MissingReason, Report, ReportEntry};
use crate::resolve::DocPath;
use crate::storage::Storage;
use regex::{Captures, Regex};
use std::io;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Tag of the synthetic element used to group includes
pub const DEFAULT_WRAPPER_TAG: &str = "placeholder";

static COMMENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:<!--.*?-->\s*)+$").unwrap());

static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

/// What happens to wrapper elements once their includes are expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapperMode {
    /// Drop the wrapper tags and keep their content in place
    #[default]
    Flatten,
    /// Replace the wrapper with a CDATA section holding its content
    Cdata,
}

/// Options for [`Expander`]
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Name of the wrapper element removed by the cleanup pass
    pub wrapper_tag: String,
    pub wrapper_mode: WrapperMode,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            wrapper_tag: DEFAULT_WRAPPER_TAG.to_string(),
            wrapper_mode: WrapperMode::default(),
        }
    }
}

/// Result of expanding one top-level document
#[derive(Debug, Clone)]
pub struct Expansion {
    pub path: DocPath,
    /// Fully expanded text
    pub text: String,
    /// Events in the order they were produced, depth-first
    pub report: Report,
}

/// Textual cleanup applied to every document after its directives are replaced
#[derive(Debug)]
struct Cleanup {
    wrapper_tags: Regex,
    wrapper_element: Regex,
    mode: WrapperMode,
}

impl Cleanup {
    fn new(options: &ExpandOptions) -> Result<Self> {
        let tag = regex::escape(&options.wrapper_tag);
        Ok(Self {
            wrapper_tags: Regex::new(&format!(r"(?i)</?{tag}\s*>"))?,
            wrapper_element: Regex::new(&format!(r"(?is)<{tag}\s*>(.*?)</{tag}\s*>"))?,
            mode: options.wrapper_mode,
        })
    }

    fn apply(&self, text: &str) -> String {
        let stripped = strip_comment_lines(text);
        match self.mode {
            WrapperMode::Flatten => self.wrapper_tags.replace_all(&stripped, "").into_owned(),
            WrapperMode::Cdata => self
                .wrapper_element
                .replace_all(&stripped, |caps: &Captures| {
                    let inner = CDATA_RE.replace_all(caps[1].trim(), "$1");
                    format!("\n<![CDATA[\n{inner}\n]]>")
                })
                .into_owned(),
        }
    }
}

/// Drops lines holding nothing but comments, unless one of them is still a
/// directive. Line terminators of the kept lines are untouched.
fn strip_comment_lines(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| {
            let content = line.trim_end_matches(['\n', '\r']);
            !COMMENT_LINE_RE.is_match(content) || contains_directive(content)
        })
        .collect()
}

/// If the span `start..end` is the only non-blank content of its line,
/// returns the offset where the next line begins.
fn sole_on_line(text: &str, start: usize, end: usize) -> Option<usize> {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    if !text[line_start..start].chars().all(|c| c == ' ' || c == '\t') {
        return None;
    }

    let rest = &text[end..];
    let line_end = rest.find('\n').map_or(text.len(), |i| end + i + 1);
    text[end..line_end]
        .chars()
        .all(char::is_whitespace)
        .then_some(line_end)
}

/// Marks where cycle-cut raw text goes until the whole expansion is done,
/// so no enclosing cleanup pass touches it. NUL cannot occur in XML.
static CUT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00(\d+)\x00").unwrap());

fn cut_marker(index: usize) -> String {
    format!("\0{index}\0")
}

/// State of one top-level expansion
struct Walk {
    /// Documents currently being expanded, outermost first
    chain: Vec<DocPath>,
    report: Report,
    /// Raw texts spliced in for cycle-cut references, by marker index
    cut: Vec<String>,
}

impl Walk {
    /// Puts the cycle-cut raw texts back in place of their markers
    fn restore(&self, text: &str) -> String {
        CUT_MARKER_RE
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.cut.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Expands include directives using documents from a [`Storage`]
pub struct Expander<'s, S: Storage + ?Sized> {
    storage: &'s S,
    cleanup: Cleanup,
}

impl<'s, S: Storage + ?Sized> Expander<'s, S> {
    /// Creates an expander reading documents from `storage`.
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::Regex` if the wrapper tag does not produce a
    /// valid pattern.
    pub fn new(storage: &'s S, options: &ExpandOptions) -> Result<Self> {
        Ok(Self {
            storage,
            cleanup: Cleanup::new(options)?,
        })
    }

    /// Expands a top-level document with an empty chain.
    ///
    /// Missing or invalid nested includes and cycles are recorded in the
    /// returned report and never fail the expansion.
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::Load` if the document itself cannot be read.
    pub fn expand(&self, path: &DocPath) -> Result<Expansion> {
        let raw = self
            .storage
            .read(path)
            .map_err(|source| CompilerError::Load {
                path: path.to_string(),
                source,
            })?;

        let mut walk = Walk {
            chain: vec![path.clone()],
            report: Report::new(),
            cut: Vec::new(),
        };
        walk.report.push(ReportEntry::Processed { path: path.clone() });

        let expanded = self.expand_text(&raw, &mut walk);
        let text = if walk.cut.is_empty() {
            expanded
        } else {
            walk.restore(&expanded)
        };
        debug!(path = %path, included = walk.report.included_count(), "expanded document");

        Ok(Expansion {
            path: path.clone(),
            text,
            report: walk.report,
        })
    }

    /// Replaces every directive of `text`, which belongs to the last
    /// document of the chain, then runs the cleanup pass.
    fn expand_text(&self, text: &str, walk: &mut Walk) -> String {
        let Some(referrer) = walk.chain.last().cloned() else {
            return text.to_string();
        };

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for directive in find_directives(text) {
            output.push_str(&text[cursor..directive.start]);
            cursor = directive.end;

            match self.expand_reference(directive.path, &referrer, walk) {
                Some(replacement) => output.push_str(&replacement),
                None => {
                    // A missing include takes its whole line with it
                    if let Some(next_line) = sole_on_line(text, directive.start, directive.end) {
                        let kept = output.trim_end_matches([' ', '\t']).len();
                        output.truncate(kept);
                        cursor = next_line;
                    }
                }
            }
        }
        output.push_str(&text[cursor..]);

        self.cleanup.apply(&output)
    }

    /// Returns the replacement for one directive, or `None` when its target
    /// cannot be loaded.
    fn expand_reference(
        &self,
        reference: &str,
        referrer: &DocPath,
        walk: &mut Walk,
    ) -> Option<String> {
        let target = match DocPath::parse(reference, referrer.as_str()) {
            Ok(target) => target,
            Err(err) => {
                warn!(%err, "skipping include");
                walk.report.push(ReportEntry::MissingInclude {
                    path: reference.trim().to_string(),
                    reason: MissingReason::InvalidPath,
                });
                return None;
            }
        };

        if walk.chain.contains(&target) {
            warn!(path = %target, from = %referrer, "include cycle, not expanding again");
            walk.report.push(ReportEntry::CycleDetected {
                path: target.clone(),
                chain: walk.chain.clone(),
            });
            let raw = self.storage.read(&target).unwrap_or_default();
            walk.cut.push(raw);
            return Some(cut_marker(walk.cut.len() - 1));
        }

        match self.storage.read(&target) {
            Ok(raw) => {
                walk.chain.push(target.clone());
                let expanded = self.expand_text(&raw, walk);
                walk.chain.pop();

                debug!(path = %target, from = %referrer, "included");
                walk.report.push(ReportEntry::Included { path: target });
                Some(expanded)
            }
            Err(err) => {
                warn!(path = %target, from = %referrer, %err, "missing include");
                let reason = match err.kind() {
                    io::ErrorKind::NotFound => MissingReason::NotFound,
                    io::ErrorKind::InvalidInput => MissingReason::InvalidPath,
                    _ => MissingReason::Unreadable,
                };
                walk.report.push(ReportEntry::MissingInclude {
                    path: target.to_string(),
                    reason,
                });
                None
            }
        }
    }
}
