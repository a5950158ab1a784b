//! censo CLI - Prison Census Report Engine
//!
//! Command-line interface for validating topologies and producing the daily
//! Control/SEI census workbook.

mod diagnostics;

use anyhow::{Context, Result};
use censo_config::{load_records, load_topology};
use censo_core::{Diagnostic, DiagnosticCode, DiagnosticEmitter, Shift, Topology};
use censo_render::{CensusReport, ReportBook};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use diagnostics::{ExitCode, JsonEmitter, Policy, TerminalEmitter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "censo")]
#[command(author, version, about = "Prison census report engine", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the census workbook from captured records
    Report {
        /// Topology document (JSON or TOML)
        #[arg(short, long, value_name = "FILE")]
        topology: PathBuf,

        /// Captured record file (JSON)
        #[arg(short, long, value_name = "FILE")]
        records: PathBuf,

        /// Unit to report, in workbook order (default: every unit in the record file)
        #[arg(short, long = "unit", value_name = "UNIT")]
        units: Vec<String>,

        /// Directory receiving the workbook under its default name
        #[arg(short, long = "output-dir", value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Explicit workbook path
        #[arg(long, value_name = "PATH", conflicts_with = "output_dir")]
        file: Option<PathBuf>,

        /// Report date (default: today)
        #[arg(short, long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Diagnostic output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Only show errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Load and validate a topology document
    Check {
        /// Topology document (JSON or TOML)
        #[arg(short, long, value_name = "FILE")]
        topology: PathBuf,
    },

    /// Print the shift on duty and the default workbook name
    Shift {
        /// Date (default: today)
        #[arg(short, long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
}

fn main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let code = match cli.command {
        Some(Commands::Report {
            topology,
            records,
            units,
            output_dir,
            file,
            date,
            format,
            strict,
            quiet,
        }) => {
            let options = ReportArgs {
                topology,
                records,
                units,
                output_dir,
                file,
                date: date.unwrap_or_else(today),
            };
            let policy = Policy { strict, quiet };
            if format == "json" {
                cmd_report_json(&options, policy)?
            } else {
                cmd_report_text(&options, policy)?
            }
        }
        Some(Commands::Check { topology }) => cmd_check(&topology),
        Some(Commands::Shift { date }) => {
            cmd_shift(date.unwrap_or_else(today));
            ExitCode::Success
        }
        None => {
            println!("censo - Prison Census Report Engine");
            println!("Run with --help for usage information");
            ExitCode::Success
        }
    };

    Ok(code.into())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// report
// ============================================================================

struct ReportArgs {
    topology: PathBuf,
    records: PathBuf,
    units: Vec<String>,
    output_dir: PathBuf,
    file: Option<PathBuf>,
    date: NaiveDate,
}

/// Outcome of a report run, before printing
struct ReportRun {
    book: Option<ReportBook>,
    path: Option<PathBuf>,
}

fn cmd_report_text(args: &ReportArgs, policy: Policy) -> Result<ExitCode> {
    let mut emitter = TerminalEmitter::new(std::io::stderr(), policy);
    let run = run_report(args, &mut emitter)?;

    if let (Some(book), Some(path)) = (&run.book, &run.path) {
        println!("Wrote {}", path.display());
        for unit in &book.units {
            println!("  {}", unit.summary);
        }
        let warnings = emitter.tally().warnings;
        if warnings > 0 {
            println!("{warnings} warning(s)");
        }
    }

    Ok(emitter.exit_code())
}

fn cmd_report_json(args: &ReportArgs, policy: Policy) -> Result<ExitCode> {
    let mut emitter = JsonEmitter::new(policy);
    let run = run_report(args, &mut emitter)?;

    let units: Vec<serde_json::Value> = run
        .book
        .iter()
        .flat_map(|book| &book.units)
        .map(|unit| {
            serde_json::json!({
                "unit": unit.summary.unit,
                "records": unit.summary.records,
                "counted": unit.summary.accepted,
                "dropped": unit.summary.rejected,
                "occupants": unit.summary.occupants,
            })
        })
        .collect();

    let code = emitter.exit_code();
    let document = emitter.finish(serde_json::json!({
        "date": args.date.format("%Y-%m-%d").to_string(),
        "shift": Shift::on(args.date).as_str(),
        "workbook": run.path.as_ref().map(|p| p.display().to_string()),
        "units": units,
    }));
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(code)
}

/// Load inputs, run the pipeline and write the workbook.
///
/// An invalid topology is reported as `E002` rather than returned, so it reaches the
/// chosen output format; a workbook that cannot be written is returned as an error.
fn run_report(args: &ReportArgs, emitter: &mut dyn DiagnosticEmitter) -> Result<ReportRun> {
    let topology = match load_checked(&args.topology, emitter) {
        Some(topology) => topology,
        None => {
            return Ok(ReportRun {
                book: None,
                path: None,
            })
        }
    };

    let records = load_records(&args.records)
        .with_context(|| format!("failed to load records from {}", args.records.display()))?;

    let units: Vec<&str> = if args.units.is_empty() {
        records.unit_codes().collect()
    } else {
        args.units.iter().map(String::as_str).collect()
    };
    tracing::info!(units = units.len(), date = %args.date, "building report");

    let report = CensusReport::new(args.date);
    let book = report.build(
        &topology,
        units.iter().map(|unit| (*unit, records.unit(unit))),
        emitter,
    )?;

    if book.is_empty() {
        return Ok(ReportRun {
            book: None,
            path: None,
        });
    }

    let path = match &args.file {
        Some(path) => {
            book.save_as(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            path.clone()
        }
        None => book
            .save(&args.output_dir)
            .with_context(|| format!("failed to write into {}", args.output_dir.display()))?,
    };

    Ok(ReportRun {
        book: Some(book),
        path: Some(path),
    })
}

/// Load a topology, reporting failures as `E002`
fn load_checked(path: &Path, emitter: &mut dyn DiagnosticEmitter) -> Option<Topology> {
    match load_topology(path) {
        Ok(topology) => Some(topology),
        Err(e) => {
            emitter.emit(
                Diagnostic::new(DiagnosticCode::E002InvalidTopology, e.to_string())
                    .with_note(format!("while loading {}", path.display())),
            );
            None
        }
    }
}

// ============================================================================
// check
// ============================================================================

fn cmd_check(path: &Path) -> ExitCode {
    let mut emitter = TerminalEmitter::new(std::io::stderr(), Policy::default());
    let Some(topology) = load_checked(path, &mut emitter) else {
        return emitter.exit_code();
    };

    println!("Checking: {}", path.display());
    for code in topology.unit_codes() {
        let Ok(unit) = topology.unit(code) else {
            continue;
        };
        let housing = unit.housing_blocks().count();
        println!("{code}: {} block(s), {housing} housing", unit.blocks.len());
        for (block_code, block) in &unit.blocks {
            let cells: usize = block.wings.values().map(|w| w.cells.len()).sum();
            println!(
                "  {:<12} {:>3} wing(s) {:>4} cell(s)  {}",
                block_code,
                block.wings.len(),
                cells,
                block.display_name(block_code)
            );
        }
        let summary = &unit.summary;
        let lines: usize = summary.sections.iter().map(|s| s.lines.len()).sum();
        println!(
            "  summary: {} section(s), {lines} line(s), {} trailer line(s)",
            summary.sections.len(),
            summary.trailer.len()
        );
    }
    println!("OK");

    emitter.exit_code()
}

// ============================================================================
// shift
// ============================================================================

fn cmd_shift(date: NaiveDate) {
    let shift = Shift::on(date);
    println!("{} {}", shift.as_str(), censo_core::shift::header_date(date));
    println!("{}", censo_core::shift::report_file_name(date));
}
