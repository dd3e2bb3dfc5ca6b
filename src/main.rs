use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xml_compiler::expand::DEFAULT_WRAPPER_TAG;
use xml_compiler::{
    BatchOutcome, CompilerConfig, DocumentStatus, ExpandOptions, Result, WrapperMode, compile,
    document_globs, list_documents,
};

const LONG_HELP: &str = r#"
Directive:
  <!-- #include file="shared/header.xml" -->
  <!-- #include file="Wolf\fragment.xml" -->

  Paths use either separator and are resolved against the content root,
  no matter how deeply the including file is nested. Missing files are
  elided and logged. Include cycles are cut and logged.

Layout:
  ROOT/KFM/1_main.xml        - compiled (one level below ROOT)
  ROOT/shared/header.xml     - compiled too, and includable from anywhere
  ROOT/KFM/parts/a.xml       - only reachable through includes
  ROOT/Compiled/KFM/1_main.xml  - output
  ROOT/processing.log        - timestamped log of the last run

Examples:
  # Compile the current directory
  xml-compiler
  # Compile another content root
  xml-compiler /path/to/content
  # Only compile files named like 1_*.xml
  xml-compiler --match '[0-9]_*.xml'
  # Skip a folder
  xml-compiler -x 'drafts/*'
  # See what would be compiled and what each file includes
  xml-compiler --list=json
  # Expand and log without writing anything
  xml-compiler --dry-run
"#;

/// Compile XML documents by inlining `#include` directives.
///
/// Copyright 2025 xml-compiler contributors.
/// Licensed under the EUPL v1.2.
#[derive(Parser, Debug)]
#[command(
    name = "xml-compiler",
    version,
    about = "Compile XML documents by inlining #include directives.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Content root (defaults to the current directory)
    #[arg(value_name = "ROOT", env = "XML_COMPILER_ROOT")]
    root: Option<PathBuf>,

    /// Output directory (defaults to ROOT/Compiled)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Processing log file (defaults to ROOT/processing.log)
    #[arg(long, value_name = "FILE", conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,

    /// Don't write a processing log
    #[arg(long)]
    no_log_file: bool,

    /// File-name globs selecting top-level documents (repeatable)
    #[arg(short, long = "match", value_name = "GLOB", action = clap::ArgAction::Append)]
    matches: Vec<String>,

    /// Exclude glob patterns relative to ROOT (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "GLOB", action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Name of the wrapper element flattened after expansion
    #[arg(long, value_name = "TAG", default_value = DEFAULT_WRAPPER_TAG)]
    wrapper_tag: String,

    /// Turn wrapper elements into CDATA sections instead of flattening them
    #[arg(long)]
    cdata: bool,

    /// Compile documents one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Expand and log, but don't write output files
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// List documents and their directives (optionally with format: plain, json)
    #[arg(long, value_name = "FORMAT", num_args = 0..=1, default_missing_value = "plain")]
    list: Option<ListFormat>,

    /// Also write the processing report as JSON
    #[arg(long, value_name = "FILE", conflicts_with = "list")]
    report_json: Option<PathBuf>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum ListFormat {
    /// Documents and references, one per line
    Plain,
    /// JSON output for scripting
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let result = if let Some(format) = cli.list {
        list(&config, format).map(|()| true)
    } else {
        run(&config, &cli)
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => Some("error"),
        (false, 0) => None,
        (false, 1) => Some("info"),
        (false, 2) => Some("debug"),
        (false, _) => Some("trace"),
    };

    // Without flags, RUST_LOG decides and warnings are the floor
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<CompilerConfig> {
    let mut config = CompilerConfig::default();
    if let Some(root) = &cli.root {
        config.root.clone_from(root);
    }
    config.output_dir.clone_from(&cli.output_dir);
    config.log_file.clone_from(&cli.log_file);
    config.write_log = !cli.no_log_file;
    config.parallel = !cli.sequential;
    config.dry_run = cli.dry_run;

    if !cli.matches.is_empty() {
        config.discovery.include = document_globs(&cli.matches)?;
    }
    if !cli.exclude.is_empty() {
        config.discovery.exclude = Some(document_globs(&cli.exclude)?);
    }

    config.expand = ExpandOptions {
        wrapper_tag: cli.wrapper_tag.clone(),
        wrapper_mode: if cli.cdata {
            WrapperMode::Cdata
        } else {
            WrapperMode::Flatten
        },
    };

    Ok(config)
}

fn run(config: &CompilerConfig, cli: &Cli) -> Result<bool> {
    let outcome = compile(config)?;

    if let Some(path) = &cli.report_json {
        let json = serde_json::to_string_pretty(&outcome.report())?;
        std::fs::write(path, json)?;
    }

    if !cli.quiet {
        print_summary(&outcome, config.dry_run);
    }

    Ok(outcome.is_success())
}

fn print_summary(outcome: &BatchOutcome, dry_run: bool) {
    let report = outcome.report();

    for document in &outcome.documents {
        match &document.status {
            DocumentStatus::Compiled { output: Some(output) } => {
                println!("✓ {} -> {}", document.path, output.display());
            }
            DocumentStatus::Compiled { output: None } => println!("✓ {}", document.path),
            DocumentStatus::LoadFailed => println!("✗ {} (could not be loaded)", document.path),
            DocumentStatus::WriteFailed { error } => {
                println!("✗ {} (write failed: {error})", document.path);
            }
        }
    }

    println!(
        "\nSummary: {} documents{}",
        outcome.documents.len(),
        if dry_run { " (dry run)" } else { "" }
    );
    println!("  ✓ {} includes", report.included_count());
    if report.missing_count() > 0 {
        println!("  ✗ {} missing includes", report.missing_count());
    }
    if report.cycle_count() > 0 {
        println!("  ↻ {} include cycles cut", report.cycle_count());
    }
    if outcome.failure_count() > 0 {
        println!("  ✗ {} documents failed", outcome.failure_count());
    }
}

fn list(config: &CompilerConfig, format: ListFormat) -> Result<()> {
    let listings = list_documents(config)?;

    match format {
        ListFormat::Plain => {
            for listing in &listings {
                println!("{}", listing.path);
                if let Some(error) = &listing.error {
                    println!("  Error: {error}");
                }
                for directive in &listing.directives {
                    match (&directive.path, &directive.error) {
                        (Some(path), _) => println!(
                            "  {} -> {path}{}",
                            directive.reference,
                            if directive.exists { "" } else { " (not found)" }
                        ),
                        (None, Some(error)) => println!("  {} -> Error: {error}", directive.reference),
                        (None, None) => println!("  {}", directive.reference),
                    }
                }
            }
        }
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&listings)?;
            println!("{json}");
        }
    }

    Ok(())
}
