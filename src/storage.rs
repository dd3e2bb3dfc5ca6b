use crate::error::CompilerError;
use crate::resolve::{ContentRoot, DocPath};
use std::fs;
use std::io;

/// Read access to documents under a content root.
///
/// Implementations must be shareable across threads so top-level
/// documents can be expanded in parallel.
pub trait Storage: Sync {
    /// Reads the full text of a document.
    ///
    /// # Errors
    ///
    /// Returns an error of kind `io::ErrorKind::NotFound` if the document
    /// does not exist, `io::ErrorKind::InvalidInput` if it lies outside the
    /// content root, or any other IO error raised while reading it.
    fn read(&self, path: &DocPath) -> io::Result<String>;
}

/// Reads documents from the local file system
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: ContentRoot,
}

impl FsStorage {
    pub fn new(root: ContentRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ContentRoot {
        &self.root
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &DocPath) -> io::Result<String> {
        // Symlinks are followed, so the check runs on the real location
        let location = self.root.path_of(path).canonicalize()?;
        if !location.starts_with(self.root.dir()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                CompilerError::PathTraversal { path: location },
            ));
        }

        if !location.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", location.display()),
            ));
        }

        fs::read_to_string(location)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;

    /// Storage backed by a map, for tests
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStorage {
        files: HashMap<String, String>,
    }

    impl MemoryStorage {
        pub(crate) fn with(mut self, path: &str, text: &str) -> Self {
            self.files.insert(path.to_string(), text.to_string());
            self
        }
    }

    impl Storage for MemoryStorage {
        fn read(&self, path: &DocPath) -> io::Result<String> {
            self.files
                .get(path.as_str())
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(path: &str) -> DocPath {
        DocPath::parse(path, "test").unwrap()
    }

    #[test]
    fn test_fs_storage_read() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("Wolf")).unwrap();
        fs::write(temp_dir.path().join("Wolf/단타.xml"), "<wolf/>").unwrap();

        let storage = FsStorage::new(ContentRoot::open(temp_dir.path()).unwrap());
        assert_eq!(storage.read(&doc(r"Wolf\단타.xml")).unwrap(), "<wolf/>");
    }

    #[test]
    fn test_fs_storage_not_found() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("dir.xml")).unwrap();

        let storage = FsStorage::new(ContentRoot::open(temp_dir.path()).unwrap());

        let err = storage.read(&doc("missing.xml")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        // Directories are not documents
        let err = storage.read(&doc("dir.xml")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_storage_symlink_escape() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.xml"), "<secret/>").unwrap();
        fs::write(temp_dir.path().join("inside.xml"), "<inside/>").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("inside.xml"),
            temp_dir.path().join("alias.xml"),
        )
        .unwrap();

        let storage = FsStorage::new(ContentRoot::open(temp_dir.path()).unwrap());

        let err = storage.read(&doc("link/secret.xml")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("Path traversal detected"));

        // Links that stay inside the root are fine
        assert_eq!(storage.read(&doc("alias.xml")).unwrap(), "<inside/>");
    }
}
