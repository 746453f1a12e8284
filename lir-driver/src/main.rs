//! LIR loader driver
//! 
//! Loads an LIR document emitted by the compiler front end and prints the
//! reconstructed program in canonical text form (or as normalized JSON).

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use lir_ir::{parse_program_str, write_program, Program};
use log::info;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lirdump")]
#[command(about = "Load an LIR document and print its canonical form")]
#[command(version = "0.1.0")]
struct Cli {
    /// LIR document (JSON)
    input: PathBuf,

    /// Part of the program to print
    #[arg(short, long, value_enum, default_value_t = Section::All)]
    section: Section,

    /// Print only the named function
    #[arg(short, long)]
    function: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log loader progress (same as RUST_LOG=debug)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    All,
    Globals,
    Structs,
    Externs,
    Functions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let program = parse_program_str(&text)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    info!(
        "loaded {}: {} globals, {} structs, {} externs, {} functions",
        cli.input.display(),
        program.globals.len(),
        program.structs.len(),
        program.externs.len(),
        program.functions.len()
    );

    let program = select(program, cli.section, cli.function.as_deref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        Format::Text => write_program(&program, &mut out)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &program)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Keep only the part of `program` the user asked for
fn select(mut program: Program, section: Section, function: Option<&str>) -> Result<Program> {
    if let Some(name) = function {
        let function = program
            .functions
            .remove(name)
            .ok_or_else(|| anyhow!("no function named `{}`", name))?;
        return Ok(Program {
            functions: HashMap::from([(name.to_string(), function)]),
            ..Program::default()
        });
    }

    Ok(match section {
        Section::All => program,
        Section::Globals => Program { globals: program.globals, ..Program::default() },
        Section::Structs => Program { structs: program.structs, ..Program::default() },
        Section::Externs => Program { externs: program.externs, ..Program::default() },
        Section::Functions => Program { functions: program.functions, ..Program::default() },
    })
}
