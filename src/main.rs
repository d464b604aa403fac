//! flowdx CLI
//!
//! Parses, type-checks, and lowers a WDL workflow file into the staged
//! workflow graph IR, printed as JSON.

#![allow(clippy::result_large_err)]

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use flowdx::ir::{self, CompileOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

/// Default WDL version assumed before the document's own `version` statement
/// is read; overridden once parsing discovers the real one.
const DEFAULT_WDL_VERSION: &str = "1.2";

#[derive(Parser)]
#[command(
    name = "flowdx",
    version,
    about = "Lowers a WDL workflow into a staged workflow graph for the DX platform"
)]
struct Args {
    /// WDL file to compile.
    wdl_file: PathBuf,

    /// Build an unlocked workflow (internal unbound call inputs are exposed
    /// as additional external inputs) instead of the default locked one.
    #[arg(long)]
    unlocked: bool,

    /// Append a workflow-output-reorganization stage.
    #[arg(long)]
    reorg: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("error: a global tracing subscriber is already set");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.wdl_file)
        .map_err(|e| format!("failed to read '{}': {e}", args.wdl_file.display()))?;

    let mut document = flowdx::parser::parse_document(&source, DEFAULT_WDL_VERSION)
        .map_err(|e| format!("parse error: {e}"))?;
    document.typecheck().map_err(|e| format!("type error: {e}"))?;

    let opts = CompileOptions {
        locked: !args.unlocked,
        reorg: args.reorg,
    };
    let resolver = ir::resolver::NullDxUrlResolver;
    let namespace =
        ir::compile_namespace(&document, &opts, &resolver).map_err(|e| format!("{e}"))?;

    let json = serde_json::to_string_pretty(&namespace)
        .map_err(|e| format!("failed to serialize namespace: {e}"))?;
    println!("{json}");
    Ok(())
}
