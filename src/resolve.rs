//! Path resolution for include references.
//!
//! Every reference is resolved against a single content root, never against
//! the directory of the document that contains it. Both `/` and `\` are
//! accepted as separators and normalized to `/` before any lookup.

use crate::error::{CompilerError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Separator used by every [`DocPath`]
pub const SEPARATOR: char = '/';

/// Canonical, root-relative path of a document.
///
/// Always uses `/` as separator and never contains empty, `.` or `..`
/// components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocPath(String);

impl DocPath {
    /// Normalizes a raw reference into a canonical path.
    ///
    /// Leading separators are ignored, so `/a.xml` and `a.xml` are the same
    /// document.
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::InvalidPath` if the reference is empty, climbs
    /// above the content root, or names a drive.
    pub fn parse(reference: &str, referrer: &str) -> Result<Self> {
        let invalid = |reason: &str| CompilerError::InvalidPath {
            reference: reference.to_string(),
            referrer: referrer.to_string(),
            reason: reason.to_string(),
        };

        let unified = reference.trim().replace('\\', "/");
        let mut components: Vec<&str> = Vec::new();

        for (index, part) in unified.split(SEPARATOR).enumerate() {
            match part {
                "" | "." => {}
                ".." => {
                    if components.pop().is_none() {
                        return Err(invalid("escapes the content root"));
                    }
                }
                drive if index == 0 && drive.ends_with(':') => {
                    return Err(invalid("absolute paths are not allowed"));
                }
                name => components.push(name),
            }
        }

        if components.is_empty() {
            return Err(invalid("no file named"));
        }

        Ok(Self(components.join("/")))
    }

    /// The path as a `/`-separated string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path components
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The directory all documents and references are resolved against
#[derive(Debug, Clone)]
pub struct ContentRoot {
    dir: PathBuf,
}

impl ContentRoot {
    /// Opens a content root.
    ///
    /// # Errors
    ///
    /// - `CompilerError::MissingRoot` if `dir` is not an existing directory.
    /// - `CompilerError::Io` if the directory cannot be canonicalized.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CompilerError::MissingRoot {
                path: dir.to_path_buf(),
            });
        }

        Ok(Self {
            dir: dir.canonicalize()?,
        })
    }

    /// Absolute directory of the root
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of a document on disk
    pub fn path_of(&self, doc: &DocPath) -> PathBuf {
        doc.components()
            .fold(self.dir.clone(), |path, part| path.join(part))
    }

    /// Converts a path found under the root back into a [`DocPath`].
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::OutsideRoot` if `path` is not below the root.
    pub fn relativize(&self, path: &Path) -> Result<DocPath> {
        let outside = || CompilerError::OutsideRoot {
            path: path.to_path_buf(),
        };

        let relative = path.strip_prefix(&self.dir).map_err(|_| outside())?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(outside()),
            }
        }

        if parts.is_empty() {
            return Err(outside());
        }

        Ok(DocPath(parts.join("/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc(path: &str) -> DocPath {
        DocPath::parse(path, "test").unwrap()
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(doc("B.xml").as_str(), "B.xml");
        assert_eq!(doc("Wolf/Pack/B.xml").as_str(), "Wolf/Pack/B.xml");
        assert_eq!(doc("  padded.xml  ").as_str(), "padded.xml");
    }

    #[test]
    fn test_parse_separator_equivalence() {
        assert_eq!(doc(r"Wolf\단타.xml"), doc("Wolf/단타.xml"));
        assert_eq!(doc(r"a\b/c\d.xml").as_str(), "a/b/c/d.xml");
    }

    #[test]
    fn test_parse_removes_redundancy() {
        assert_eq!(doc("./a/./b.xml").as_str(), "a/b.xml");
        assert_eq!(doc("a//b.xml").as_str(), "a/b.xml");
        assert_eq!(doc("a/x/../b.xml").as_str(), "a/b.xml");
        assert_eq!(doc("/a.xml").as_str(), "a.xml");
        assert_eq!(doc(r"\\a.xml").as_str(), "a.xml");
    }

    #[test]
    fn test_parse_rejects_escape() {
        let result = DocPath::parse("../outside.xml", "KFM/1_main.xml");
        assert!(matches!(result, Err(CompilerError::InvalidPath { .. })));

        let result = DocPath::parse(r"a\..\..\outside.xml", "KFM/1_main.xml");
        assert!(matches!(result, Err(CompilerError::InvalidPath { .. })));
    }

    #[test]
    fn test_parse_rejects_empty_target() {
        for reference in ["", "   ", ".", "/", "a/..", r"\"] {
            let result = DocPath::parse(reference, "x.xml");
            assert!(
                matches!(result, Err(CompilerError::InvalidPath { .. })),
                "{reference:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_parse_rejects_drive() {
        let result = DocPath::parse(r"C:\frag.xml", "x.xml");
        assert!(matches!(result, Err(CompilerError::InvalidPath { .. })));
    }

    #[test]
    fn test_parse_ignores_referrer_directory() {
        let shallow = DocPath::parse("shared/a.xml", "top.xml").unwrap();
        let deep = DocPath::parse("shared/a.xml", "x/y/z/nested.xml").unwrap();
        assert_eq!(shallow, deep);
        assert_eq!(shallow.as_str(), "shared/a.xml");
    }

    #[test]
    fn test_path_of_and_relativize() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("KFM")).unwrap();
        fs::write(temp_dir.path().join("KFM/1_main.xml"), "<a/>").unwrap();

        let root = ContentRoot::open(temp_dir.path()).unwrap();
        let path = root.path_of(&doc(r"KFM\1_main.xml"));
        assert!(path.is_file());
        assert_eq!(root.relativize(&path).unwrap().as_str(), "KFM/1_main.xml");
    }

    #[test]
    fn test_relativize_outside_root() {
        let temp_dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let root = ContentRoot::open(temp_dir.path()).unwrap();

        let result = root.relativize(&other.path().join("a.xml"));
        assert!(matches!(result, Err(CompilerError::OutsideRoot { .. })));

        let result = root.relativize(root.dir());
        assert!(matches!(result, Err(CompilerError::OutsideRoot { .. })));
    }

    #[test]
    fn test_open_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = ContentRoot::open(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(CompilerError::MissingRoot { .. })));
    }
}
