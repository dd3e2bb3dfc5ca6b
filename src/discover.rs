use crate::error::Result;
use crate::resolve::{ContentRoot, DocPath};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// Default file-name pattern for top-level documents
pub const DEFAULT_DOCUMENT_GLOB: &str = "*.xml";

static DEFAULT_INCLUDE: LazyLock<GlobSet> =
    LazyLock::new(|| document_globs(&[DEFAULT_DOCUMENT_GLOB]).unwrap());

/// Selects which top-level documents a run compiles
#[derive(Debug, Clone)]
pub struct Discovery {
    /// File names that qualify as documents
    pub include: GlobSet,
    /// Root-relative paths to leave out
    pub exclude: Option<GlobSet>,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE.clone(),
            exclude: None,
        }
    }
}

/// Builds a glob set from patterns.
///
/// # Errors
///
/// Returns `CompilerError::Glob` if any pattern is invalid.
pub fn document_globs<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}

impl Discovery {
    /// Finds documents exactly one directory level below the root, sorted by
    /// path. Anything under `skip_dir` (the output directory) is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::WalkDir` if the root cannot be traversed.
    pub fn scan(&self, root: &ContentRoot, skip_dir: Option<&Path>) -> Result<Vec<DocPath>> {
        let skip = skip_dir.and_then(|dir| dir.canonicalize().ok());
        let mut documents = Vec::new();

        let walker = WalkDir::new(root.dir())
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| skip.as_deref() != Some(entry.path()));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file()
                || !self.include.is_match(entry.file_name())
                || skip.as_deref().is_some_and(|dir| entry.path().starts_with(dir))
            {
                continue;
            }

            let doc = root.relativize(entry.path())?;
            if self
                .exclude
                .as_ref()
                .is_some_and(|exclude| exclude.is_match(doc.as_str()))
            {
                debug!(path = %doc, "excluded");
                continue;
            }

            documents.push(doc);
        }

        documents.sort();
        Ok(documents)
    }
}
