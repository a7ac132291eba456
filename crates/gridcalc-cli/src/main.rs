//! gridcalc CLI - formula evaluation and cell script tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gridcalc::prelude::*;
use gridcalc::{dependencies_of, evaluate, function_registry, parse_formula, Environment};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Formula evaluation and recalculation tool")]
struct Cli {
    /// Log recalculation events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single expression with no cells set
    Eval {
        /// Formula text, with or without a leading '='
        expr: String,

        /// Print the parsed syntax tree
        #[arg(long)]
        ast: bool,
    },

    /// List the cells an expression reads
    Deps {
        /// Formula text, with or without a leading '='
        expr: String,
    },

    /// Run a cell script and print every non-empty cell
    ///
    /// Each line has the form `A1: text`; formulas start with '='.
    /// Blank lines and lines starting with '#' are ignored.
    Run {
        /// Script file
        file: PathBuf,
    },

    /// List the built-in functions
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Eval { expr, ast } => eval(&expr, ast),
        Commands::Deps { expr } => deps(&expr),
        Commands::Run { file } => run(&file),
        Commands::Functions => {
            for name in function_registry().names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn eval(expr: &str, show_ast: bool) -> Result<()> {
    let ast = parse_formula(expr).with_context(|| format!("Failed to parse '{}'", expr))?;
    if show_ast {
        println!("{:#?}", ast);
    }

    let value = evaluate(&ast, &EvaluationContext::simple(), &Environment::new())
        .with_context(|| format!("Failed to evaluate '{}'", expr))?;
    println!("{}", value);
    Ok(())
}

fn deps(expr: &str) -> Result<()> {
    let ast = parse_formula(expr).with_context(|| format!("Failed to parse '{}'", expr))?;

    let mut cells: Vec<_> = dependencies_of(&ast).into_iter().collect();
    cells.sort_unstable();
    for cell in cells {
        println!("{}", cell);
    }
    Ok(())
}

fn run(file: &Path) -> Result<()> {
    let entries = load_script(file)?;
    debug!(file = %file.display(), entries = entries.len(), "script loaded");
    let (sheet, stats) = run_script(&entries);

    for (addr, text) in sheet.grid().cells() {
        println!("{}\t{}", addr, text);
    }

    eprintln!(
        "Recalculated {} formulas ({} errors, {} circular)",
        stats.recalculated.len(),
        stats.errors,
        stats.circular_references
    );
    Ok(())
}

fn load_script(file: &Path) -> Result<Vec<(CellAddress, String)>> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    parse_script(&source).with_context(|| format!("Invalid script '{}'", file.display()))
}

/// Parse `A1: text` lines
fn parse_script(source: &str) -> Result<Vec<(CellAddress, String)>> {
    let mut entries = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((reference, text)) = line.split_once(':') else {
            bail!("line {}: expected 'CELL: text', found '{}'", index + 1, line);
        };
        let addr = CellAddress::parse(reference.trim())
            .with_context(|| format!("line {}", index + 1))?;
        entries.push((addr, text.trim().to_string()));
    }

    Ok(entries)
}

/// Apply script entries one edit at a time, then recompute everything once
fn run_script(entries: &[(CellAddress, String)]) -> (Spreadsheet, RecalcStats) {
    let mut sheet = Spreadsheet::with_options(CalculationOptions {
        auto_recalculate: false,
        ..Default::default()
    });

    for (addr, text) in entries {
        sheet.set_cell(*addr, text);
    }
    let stats = sheet.recalculate();
    (sheet, stats)
}
