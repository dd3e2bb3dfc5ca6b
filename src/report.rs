//! Ordered record of what happened while expanding documents.

use crate::resolve::DocPath;
use serde::Serialize;
use std::fmt;

/// Why an include produced no content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// The referenced file does not exist
    NotFound,
    /// The reference could not be canonicalized under the content root
    InvalidPath,
    /// The file exists but could not be read as text
    Unreadable,
}

/// A single processing event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEntry {
    /// A top-level document was loaded and expanded
    Processed { path: DocPath },
    /// A directive was replaced by the expanded content of `path`
    Included { path: DocPath },
    /// A directive was elided because its target could not be loaded.
    /// `path` is canonical when resolution succeeded, raw otherwise.
    MissingInclude { path: String, reason: MissingReason },
    /// `path` was referenced while already being expanded in `chain`
    CycleDetected { path: DocPath, chain: Vec<DocPath> },
    /// A top-level document could not be loaded and was skipped
    LoadFailed { path: DocPath, error: String },
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed { path } => write!(f, "Processed: {path}"),
            Self::Included { path } => write!(f, "Included: {path}"),
            Self::MissingInclude { path, .. } => write!(f, "Missing include: {path}"),
            Self::CycleDetected { path, chain } => {
                let chain = chain
                    .iter()
                    .map(DocPath::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                write!(f, "Cycle detected: {path} (chain: {chain})")
            }
            Self::LoadFailed { path, error } => write!(f, "Error processing {path}: {error}"),
        }
    }
}

/// Accumulates report entries in emission order.
///
/// Each expansion owns its own `Report`; callers combine them with
/// [`Report::merge`], which keeps the order of both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Appends all entries of `other` after the entries already present
    pub fn merge(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn included_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::Included { .. }))
    }

    pub fn missing_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::MissingInclude { .. }))
    }

    pub fn cycle_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::CycleDetected { .. }))
    }

    pub fn failure_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::LoadFailed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ReportEntry) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(e)).count()
    }
}

impl IntoIterator for Report {
    type Item = ReportEntry;
    type IntoIter = std::vec::IntoIter<ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a ReportEntry;
    type IntoIter = std::slice::Iter<'a, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<ReportEntry> for Report {
    fn from_iter<I: IntoIterator<Item = ReportEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
