use crate::error::Result;
use crate::resolve::DocPath;
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the output directory, created under the content root
pub const DEFAULT_OUTPUT_DIR: &str = "Compiled";

/// Writes compiled documents, mirroring their root-relative location
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `doc` is written
    pub fn target(&self, doc: &DocPath) -> PathBuf {
        doc.components()
            .fold(self.dir.clone(), |path, part| path.join(part))
    }

    /// Writes the compiled text of `doc`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::Io` if a directory or the file cannot be
    /// written.
    pub fn write(&self, doc: &DocPath, text: &str) -> Result<PathBuf> {
        let target = self.target(doc);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, text)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_mirrors_layout() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().join(DEFAULT_OUTPUT_DIR));
        let doc = DocPath::parse(r"KFM\1_main.xml", "test").unwrap();

        let written = writer.write(&doc, "<a/>").unwrap();
        assert_eq!(written, temp_dir.path().join("Compiled/KFM/1_main.xml"));
        assert_eq!(fs::read_to_string(&written).unwrap(), "<a/>");

        // Overwrites on a second run
        writer.write(&doc, "<b/>").unwrap();
        assert_eq!(fs::read_to_string(&written).unwrap(), "<b/>");
    }
}
