//! Batch compilation of every top-level document under a content root.

use crate::directive::find_directives;
use crate::discover::Discovery;
use crate::error::{CompilerError, Result};
use crate::expand::{ExpandOptions, Expander};
use crate::logfile::{DEFAULT_LOG_FILE, LogFile};
use crate::output::{DEFAULT_OUTPUT_DIR, OutputWriter};
use crate::report::{Report, ReportEntry};
use crate::resolve::{ContentRoot, DocPath};
use crate::storage::{FsStorage, Storage};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Configuration for a compilation run
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Content root (usually the current working directory)
    pub root: PathBuf,
    /// Output directory, `<root>/Compiled` when unset
    pub output_dir: Option<PathBuf>,
    /// Processing log path, `<root>/processing.log` when unset
    pub log_file: Option<PathBuf>,
    /// Whether to write the processing log at all
    pub write_log: bool,
    pub discovery: Discovery,
    pub expand: ExpandOptions,
    /// Expand top-level documents on the rayon thread pool
    pub parallel: bool,
    /// Expand and log, but write no output files
    pub dry_run: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            output_dir: None,
            log_file: None,
            write_log: true,
            discovery: Discovery::default(),
            expand: ExpandOptions::default(),
            parallel: true,
            dry_run: false,
        }
    }
}

impl CompilerConfig {
    pub fn output_dir(&self, root: &ContentRoot) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| root.dir().join(DEFAULT_OUTPUT_DIR))
    }

    pub fn log_file(&self, root: &ContentRoot) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| root.dir().join(DEFAULT_LOG_FILE))
    }
}

/// What happened to one top-level document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Expanded, and written to `output` unless this was a dry run
    Compiled { output: Option<PathBuf> },
    /// The document could not be loaded
    LoadFailed,
    /// Expanded, but the output could not be written
    WriteFailed { error: String },
}

#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub path: DocPath,
    pub status: DocumentStatus,
    /// Events of this document's expansion
    pub report: Report,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, DocumentStatus::Compiled { .. })
    }
}

/// Outcome of a whole run, in discovery order
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub documents: Vec<DocumentOutcome>,
}

impl BatchOutcome {
    /// True when every document compiled
    pub fn is_success(&self) -> bool {
        self.documents.iter().all(DocumentOutcome::is_success)
    }

    pub fn failure_count(&self) -> usize {
        self.documents.iter().filter(|d| !d.is_success()).count()
    }

    /// All reports merged in discovery order
    pub fn report(&self) -> Report {
        let mut merged = Report::new();
        for document in &self.documents {
            merged.merge(document.report.clone());
        }
        merged
    }
}

/// Expands and writes every top-level document found under the root.
///
/// A document that cannot be loaded or written is reported and skipped;
/// the rest of the batch still runs.
///
/// # Errors
///
/// - `CompilerError::MissingRoot` if the content root does not exist.
/// - `CompilerError::Io` if the processing log cannot be written.
/// - `CompilerError::WalkDir` if the root cannot be scanned.
/// - `CompilerError::Regex` if the wrapper tag is not usable.
pub fn compile(config: &CompilerConfig) -> Result<BatchOutcome> {
    let root = ContentRoot::open(&config.root)?;
    let output_dir = config.output_dir(&root);

    let mut log = if config.write_log {
        Some(LogFile::create(&config.log_file(&root))?)
    } else {
        None
    };
    if let Some(log) = log.as_mut() {
        log.section(&format!("Starting processing in {}", root.dir().display()))?;
    }

    let documents = config.discovery.scan(&root, Some(&output_dir))?;
    info!(count = documents.len(), root = %root.dir().display(), "discovered documents");
    if documents.is_empty() {
        warn!("no XML files found to process");
        if let Some(log) = log.as_mut() {
            log.message("No XML files found to process.")?;
        }
    }

    let storage = FsStorage::new(root.clone());
    let expander = Expander::new(&storage, &config.expand)?;
    let writer = OutputWriter::new(&output_dir);

    let compile_one = |doc: &DocPath| compile_document(&expander, &writer, doc, config.dry_run);
    let outcomes: Vec<DocumentOutcome> = if config.parallel {
        documents.par_iter().map(compile_one).collect()
    } else {
        documents.iter().map(compile_one).collect()
    };

    if let Some(log) = log.as_mut() {
        for outcome in &outcomes {
            log.entries(&outcome.report)?;
            if let DocumentStatus::WriteFailed { error } = &outcome.status {
                log.message(&format!("Error writing {}: {error}", outcome.path))?;
            }
        }
        log.section(&format!(
            "Processing complete. Compiled XMLs saved in {}",
            output_dir.display()
        ))?;
        log.flush()?;
    }

    Ok(BatchOutcome {
        root: root.dir().to_path_buf(),
        output_dir,
        documents: outcomes,
    })
}

fn compile_document<S: Storage + ?Sized>(
    expander: &Expander<'_, S>,
    writer: &OutputWriter,
    doc: &DocPath,
    dry_run: bool,
) -> DocumentOutcome {
    let expansion = match expander.expand(doc) {
        Ok(expansion) => expansion,
        Err(err) => {
            error!(path = %doc, %err, "failed to load document");
            let message = match err {
                CompilerError::Load { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            let mut report = Report::new();
            report.push(ReportEntry::LoadFailed {
                path: doc.clone(),
                error: message,
            });
            return DocumentOutcome {
                path: doc.clone(),
                status: DocumentStatus::LoadFailed,
                report,
            };
        }
    };

    let status = if dry_run {
        DocumentStatus::Compiled { output: None }
    } else {
        match writer.write(doc, &expansion.text) {
            Ok(output) => {
                info!(path = %doc, output = %output.display(), "compiled");
                DocumentStatus::Compiled {
                    output: Some(output),
                }
            }
            Err(err) => {
                error!(path = %doc, %err, "failed to write output");
                DocumentStatus::WriteFailed {
                    error: err.to_string(),
                }
            }
        }
    };

    DocumentOutcome {
        path: doc.clone(),
        status,
        report: expansion.report,
    }
}

/// A directive as seen by [`list_documents`]
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveListing {
    /// Reference as written
    pub reference: String,
    pub start: usize,
    pub end: usize,
    /// Canonical path, when the reference resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<DocPath>,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A top-level document and the directives it contains
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListing {
    pub path: DocPath,
    pub directives: Vec<DirectiveListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lists the top-level documents a run would compile and the directives in
/// each, without expanding anything.
///
/// # Errors
///
/// - `CompilerError::MissingRoot` if the content root does not exist.
/// - `CompilerError::WalkDir` if the root cannot be scanned.
pub fn list_documents(config: &CompilerConfig) -> Result<Vec<DocumentListing>> {
    let root = ContentRoot::open(&config.root)?;
    let output_dir = config.output_dir(&root);
    let storage = FsStorage::new(root.clone());

    let documents = config.discovery.scan(&root, Some(&output_dir))?;
    let listings = documents
        .into_iter()
        .map(|doc| match storage.read(&doc) {
            Ok(text) => {
                let directives = find_directives(&text)
                    .map(|directive| {
                        let resolved = DocPath::parse(directive.path, doc.as_str());
                        let exists = resolved
                            .as_ref()
                            .is_ok_and(|path| root.path_of(path).is_file());
                        let (path, error) = match resolved {
                            Ok(path) => (Some(path), None),
                            Err(err) => (None, Some(err.to_string())),
                        };
                        DirectiveListing {
                            reference: directive.path.to_string(),
                            start: directive.start,
                            end: directive.end,
                            path,
                            exists,
                            error,
                        }
                    })
                    .collect();
                DocumentListing {
                    path: doc,
                    directives,
                    error: None,
                }
            }
            Err(err) => DocumentListing {
                path: doc,
                directives: Vec::new(),
                error: Some(err.to_string()),
            },
        })
        .collect();

    Ok(listings)
}
