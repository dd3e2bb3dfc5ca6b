use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for xml-compiler operations
#[derive(Error, Debug)]
pub enum CompilerError {
    /// IO error when reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A top-level document could not be read
    #[error("Failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: io::Error,
    },

    /// An include reference that cannot be canonicalized under the content root
    #[error("Invalid include path \"{reference}\" in {referrer}: {reason}")]
    InvalidPath {
        reference: String,
        referrer: String,
        reason: String,
    },

    /// The content root is missing or is not a directory
    #[error("Content root does not exist or is not a directory: {path}")]
    MissingRoot { path: PathBuf },

    /// A discovered file lies outside the content root
    #[error("Path is outside the content root: {path}")]
    OutsideRoot { path: PathBuf },

    /// A document path that leads outside the content root, e.g. through a symlink
    #[error("Path traversal detected (trying to access files outside the content root): {path}")]
    PathTraversal { path: PathBuf },

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// `WalkDir` error when scanning the content root
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Invalid glob pattern
    #[error("Glob error: {0}")]
    Glob(#[from] globset::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompilerError::Load {
            path: "KFM/1_main.xml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(format!("{err}"), "Failed to load KFM/1_main.xml: gone");

        let err = CompilerError::InvalidPath {
            reference: "../secret.xml".to_string(),
            referrer: "KFM/1_main.xml".to_string(),
            reason: "escapes the content root".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Invalid include path \"../secret.xml\" in KFM/1_main.xml: escapes the content root"
        );

        let err = CompilerError::PathTraversal {
            path: PathBuf::from("/etc/passwd"),
        };
        assert!(format!("{err}").contains("Path traversal detected"));

        let err = CompilerError::MissingRoot {
            path: PathBuf::from("/no/such/dir"),
        };
        assert!(format!("{err}").contains("/no/such/dir"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let err: CompilerError = io_err.into();
        assert!(matches!(err, CompilerError::Io(_)));
    }

    #[test]
    fn test_error_from_glob() {
        let glob_err = globset::Glob::new("a[").unwrap_err();
        let err: CompilerError = glob_err.into();
        assert!(matches!(err, CompilerError::Glob(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: CompilerError = json_err.into();
        assert!(matches!(err, CompilerError::Json(_)));
    }
}
