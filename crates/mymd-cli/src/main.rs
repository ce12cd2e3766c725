//! MyMD CLI - Compile MyMD documents to Pandoc JSON
//!
//! Usage:
//!   mymd [OPTIONS] <COMMAND> <FILE>
//!
//! Commands:
//!   compile   Compile to Pandoc JSON
//!   check     Report diagnostics only
//!   stats     Show document statistics

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mymd_core::{Block, CompilationResult, Compiler, Diagnostic, Document};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mymd", version)]
#[command(about = "Compile MyMD documents to Pandoc JSON")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Stop at the first syntax error instead of resynchronizing
    #[arg(long, global = true)]
    no_recovery: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a document and print its Pandoc JSON
    Compile {
        /// Input file, or `-` for stdin
        input: String,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Check a document for errors without producing output
    Check {
        /// Input file, or `-` for stdin
        input: String,

        /// Print diagnostics as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show document statistics
    Stats {
        /// Input file, or `-` for stdin
        input: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Runs the selected command. `Ok(false)` means the document had
/// diagnostics.
fn run(cli: &Cli) -> Result<bool> {
    let compiler = Compiler::new().with_recovery(!cli.no_recovery);

    match &cli.command {
        Command::Compile {
            input,
            output,
            pretty,
        } => {
            let source = read_input(input)?;
            let result = compiler.with_pretty_json(*pretty).compile(&source);
            cmd_compile(input, &result, output.as_ref())
        }
        Command::Check { input, json } => {
            let source = read_input(input)?;
            cmd_check(input, &compiler.compile(&source), *json)
        }
        Command::Stats { input } => {
            let source = read_input(input)?;
            cmd_stats(input, &source, &compiler.compile(&source))
        }
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    let source = fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))?;
    debug!(path, bytes = source.len(), "read input");
    Ok(source)
}

fn format_diagnostic(path: &str, d: &Diagnostic) -> String {
    format!("{path}:{}:{}: {:?} error: {}", d.line + 1, d.column + 1, d.kind, d.message)
}

fn report(path: &str, diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("{}", format_diagnostic(path, d));
    }
}

// =============================================================================
// Compile Command
// =============================================================================

fn cmd_compile(path: &str, result: &CompilationResult, output: Option<&PathBuf>) -> Result<bool> {
    let Some(json) = &result.document_json else {
        report(path, &result.diagnostics);
        return Ok(false);
    };

    match output {
        Some(out) => {
            fs::write(out, json).with_context(|| format!("failed to write '{}'", out.display()))?;
            debug!(path = %out.display(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write stdout")?;
        }
    }
    Ok(true)
}

// =============================================================================
// Check Command
// =============================================================================

fn cmd_check(path: &str, result: &CompilationResult, json: bool) -> Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.diagnostics)?);
    } else if result.has_errors() {
        eprintln!("{path}: {} error(s) found", result.diagnostics.len());
        report(path, &result.diagnostics);
    } else {
        println!("{path}: no errors found");
    }
    Ok(!result.has_errors())
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(path: &str, source: &str, result: &CompilationResult) -> Result<bool> {
    let Some(doc) = &result.document else {
        report(path, &result.diagnostics);
        return Ok(false);
    };
    let stats = DocumentStats::from_document(doc, source);

    println!("Document Statistics");
    println!("-------------------");
    println!("Metadata keys:  {}", stats.meta_keys);
    println!();
    println!("Content:");
    println!("  Total blocks:   {}", stats.total_blocks);
    println!("  Headings:       {}", stats.headings);
    println!("  Paragraphs:     {}", stats.paragraphs);
    println!("  Code blocks:    {}", stats.code_blocks);
    println!("  Lists:          {}", stats.lists);
    println!("  List items:     {}", stats.list_items);
    println!("  Quotes:         {}", stats.quotes);
    println!("  Raw LaTeX:      {}", stats.raw_blocks);
    println!();
    println!("Size:");
    println!("  Characters:     {}", stats.chars);
    println!("  Words (est.):   {}", stats.words);
    println!("  Lines:          {}", stats.lines);

    Ok(true)
}

#[derive(Debug, Default, PartialEq)]
struct DocumentStats {
    meta_keys: usize,
    total_blocks: usize,
    headings: usize,
    paragraphs: usize,
    code_blocks: usize,
    lists: usize,
    list_items: usize,
    quotes: usize,
    raw_blocks: usize,
    chars: usize,
    words: usize,
    lines: usize,
}

impl DocumentStats {
    fn from_document(doc: &Document, source: &str) -> Self {
        let mut stats = Self {
            meta_keys: doc.meta.len(),
            chars: source.chars().count(),
            words: source.split_whitespace().count(),
            lines: source.lines().count(),
            ..Self::default()
        };
        stats.count_blocks(&doc.blocks);
        stats
    }

    fn count_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.total_blocks += 1;
            match block {
                Block::Header { .. } => self.headings += 1,
                Block::Para(_) => self.paragraphs += 1,
                Block::CodeBlock { .. } => self.code_blocks += 1,
                Block::BulletList(items) | Block::OrderedList { items, .. } => {
                    self.lists += 1;
                    self.list_items += items.len();
                    for item in items {
                        self.count_blocks(item);
                    }
                }
                Block::BlockQuote(content) => {
                    self.quotes += 1;
                    self.count_blocks(content);
                }
                Block::RawBlock { .. } => self.raw_blocks += 1,
                Block::HorizontalRule => {}
            }
        }
    }
}
