//! cellcalc - evaluate and inspect spreadsheet formulas

mod grid;

use anyhow::{Context, Result};
use cellcalc_formula::value::parse_number;
use cellcalc_formula::{expand_shared_formula, Engine, EngineConfig, EngineError, Position, Value};
use clap::{Parser, Subcommand};
use grid::Grid;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellcalc")]
#[command(author, version, about = "Spreadsheet formula evaluator")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print its result
    Eval {
        formula: String,

        /// JSON grid the formula reads cells from
        #[arg(short, long)]
        grid: Option<PathBuf>,

        /// Row of the cell holding the formula (1-based)
        #[arg(long, requires = "col")]
        row: Option<u32>,

        /// Column of the cell holding the formula (1-based)
        #[arg(long, requires = "row")]
        col: Option<u32>,

        /// Define a name (NAME=VALUE)
        #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },

    /// Re-anchor a shared formula by a row and column offset
    Shared {
        formula: String,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rows: i64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        cols: i64,
    },

    /// List the cell and range references a formula reads
    Refs { formula: String },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match cli.command {
        Commands::Eval {
            formula,
            grid,
            row,
            col,
            vars,
        } => {
            let position = row.zip(col).map(|(r, c)| Position::new(r, c));
            eval(&formula, grid, position, &vars)
        }
        Commands::Shared {
            formula,
            rows,
            cols,
        } => {
            println!("{}", expand_shared_formula(&formula, rows, cols));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Refs { formula } => refs(&formula),
    }
}

fn eval(
    formula: &str,
    grid: Option<PathBuf>,
    position: Option<Position>,
    vars: &[String],
) -> Result<ExitCode> {
    let mut config = EngineConfig::default();
    if let Some(path) = grid {
        let grid = Rc::new(Grid::load(&path)?);
        let cells = Rc::clone(&grid);
        config = config
            .with_cell_accessor(move |cell| cells.cell(cell))
            .with_range_accessor(move |area| grid.range(area));
    }
    for var in vars {
        let (name, value) = var
            .split_once('=')
            .with_context(|| format!("Invalid definition '{var}'. Expected NAME=VALUE"))?;
        config = config.with_variable(name.trim(), parse_cli_value(value));
    }

    let mut engine = Engine::new(config);
    let output = match engine.parse(formula, position) {
        Ok(output) => output,
        Err(EngineError::Syntax(diagnostic)) => {
            eprintln!("{diagnostic}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("Evaluation failed"),
    };

    println!("{}", output.result);
    if !output.detail.is_empty() {
        eprintln!("{}", output.detail);
    }
    if !engine.logs().is_empty() {
        eprintln!("Unknown functions: {}", engine.logs().join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn refs(formula: &str) -> Result<ExitCode> {
    let engine = Engine::default();
    match engine.references(formula) {
        Ok(references) => {
            for reference in references {
                println!("{reference}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(EngineError::Syntax(diagnostic)) => {
            eprintln!("{diagnostic}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a command-line value: numbers and booleans keep their type
fn parse_cli_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("TRUE") {
        Value::Boolean(true)
    } else if s.eq_ignore_ascii_case("FALSE") {
        Value::Boolean(false)
    } else if let Some(n) = parse_number(s) {
        Value::Number(n)
    } else {
        Value::text(s)
    }
}
