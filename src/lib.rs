//! # xml-compiler
//!
//! Compiles XML documents that are maintained as small, reusable fragments.
//! Fragments are pulled in with comment-embedded include directives:
//!
//! ```xml
//! <config>
//!   <!-- #include file="shared\header.xml" -->
//!   <!-- #include file="Wolf/단타.xml" -->
//! </config>
//! ```
//!
//! Every referenced file is loaded and expanded recursively, then spliced in
//! place of its directive. Paths may use either `/` or `\` and are always
//! resolved against the content root, whatever the nesting depth.
//!
//! ## Features
//!
//! - Recursive expansion with cycle detection
//! - Missing or invalid references are elided and reported, never fatal
//! - Ordered processing report (processed, included, missing, cycles)
//! - Parallel batch compilation of every document one level below the root
//! - Timestamped `processing.log`
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use xml_compiler::{ContentRoot, DocPath, ExpandOptions, Expander, FsStorage};
//!
//! let root = ContentRoot::open(std::path::Path::new("."))?;
//! let storage = FsStorage::new(root);
//! let expander = Expander::new(&storage, &ExpandOptions::default())?;
//!
//! let expansion = expander.expand(&DocPath::parse("KFM/1_main.xml", "cli")?)?;
//! println!("{}", expansion.text);
//! for entry in &expansion.report {
//!     eprintln!("{entry}");
//! }
//! # Ok::<(), xml_compiler::CompilerError>(())
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Compile every ./*/*.xml into ./Compiled
//! xml-compiler
//!
//! # Use another content root
//! xml-compiler /path/to/content
//! ```

pub mod compile;
pub mod directive;
pub mod discover;
pub mod error;
pub mod expand;
pub mod logfile;
pub mod output;
pub mod report;
pub mod resolve;
pub mod storage;

// Re-export main types and functions for convenience
pub use compile::{
    BatchOutcome, CompilerConfig, DocumentOutcome, DocumentStatus, compile, list_documents,
};
pub use directive::{Directive, find_directives};
pub use discover::{Discovery, document_globs};
pub use error::{CompilerError, Result};
pub use expand::{ExpandOptions, Expander, Expansion, WrapperMode};
pub use report::{MissingReason, Report, ReportEntry};
pub use resolve::{ContentRoot, DocPath};
pub use storage::{FsStorage, Storage};
