//! Line Item Performance Report
//!
//! Attributes dashboard purchase transactions to the ad line items in their
//! impression journeys and reconciles them against the NXN delivery lookup
//! to report spend and influenced ROAS per line item.

mod config;
mod constants;
mod display;
mod export;
mod loaders;
mod ranking;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::FileConfig;
use lineitem_core::{build_report, LineItemPerformanceRow, LineItemReport};
use ranking::{RankBy, ReportFilter, SortKey};

#[derive(Parser, Debug)]
#[command(name = "lineitem-report")]
#[command(about = "Line item performance report from transaction and NXN lookup exports")]
struct Args {
    /// Config file (optional; defaults apply when missing)
    #[arg(short, long, default_value = constants::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output directory for generated reports
    #[arg(short, long, default_value = constants::DEFAULT_OUTPUT_DIR, global = true)]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the performance report and write CSV exports
    Run {
        #[command(flatten)]
        inputs: Inputs,

        /// Also write an Excel workbook with one sheet per table
        #[arg(long)]
        xlsx: bool,

        /// Keep only these insertion order names (repeatable)
        #[arg(long = "insertion-order")]
        insertion_orders: Vec<String>,

        /// Case-insensitive search over line item ids and names
        #[arg(long)]
        search: Option<String>,

        /// Sort the performance table by this column (default: line item id)
        #[arg(long, value_enum)]
        sort_by: Option<SortKey>,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,
    },

    /// Validate an NXN lookup file without running the report
    CheckLookup {
        /// Path to lookup CSV or Excel file
        file: PathBuf,
    },

    /// Show the top performing line items
    Rank {
        #[command(flatten)]
        inputs: Inputs,

        /// Ranking to show (all three when omitted)
        #[arg(long, value_enum)]
        by: Option<RankBy>,

        /// Number of line items per ranking (default from config)
        #[arg(long)]
        top: Option<usize>,

        /// Keep only these insertion order names (repeatable)
        #[arg(long = "insertion-order")]
        insertion_orders: Vec<String>,

        /// Case-insensitive search over line item ids and names
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct Inputs {
    /// Transaction CSV or Excel files (repeatable)
    #[arg(short, long, required = true, num_args = 1..)]
    transactions: Vec<PathBuf>,

    /// NXN lookup CSV or Excel file
    #[arg(short, long)]
    lookup: PathBuf,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "lineitem_core=debug,lineitem_report=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file_config = FileConfig::load_or_default(&args.config)?;

    match args.command {
        Command::Run {
            inputs,
            xlsx,
            insertion_orders,
            search,
            sort_by,
            ascending,
        } => {
            let filter = ReportFilter {
                insertion_orders,
                search,
            };
            run_report(&args.output_dir, &file_config, &inputs, &filter, sort_by, ascending, xlsx)
        }

        Command::CheckLookup { file } => {
            println!("Checking lookup file {}...\n", file.display());
            let lookup = loaders::load_lookup(&file, &file_config.loader)?;
            display::print_lookup_check(&lookup);
            Ok(())
        }

        Command::Rank {
            inputs,
            by,
            top,
            insertion_orders,
            search,
        } => {
            let filter = ReportFilter {
                insertion_orders,
                search,
            };
            let top = top.unwrap_or(file_config.output.top_n);
            run_rankings(&file_config, &inputs, &filter, by, top)
        }
    }
}

/// Run the main report generation workflow
fn run_report(
    output_dir: &Path,
    file_config: &FileConfig,
    inputs: &Inputs,
    filter: &ReportFilter,
    sort_by: Option<SortKey>,
    ascending: bool,
    xlsx: bool,
) -> Result<()> {
    println!("Line Item Performance Report");
    println!("=============================================\n");

    let Some(report) = load_and_build(file_config, inputs)? else {
        return Ok(());
    };

    display::print_summary(&report);

    let mut view: Vec<&LineItemPerformanceRow> = filter.apply(&report.performance);
    if let Some(key) = sort_by {
        ranking::sort_rows(&mut view, key, ascending);
    }
    let totals = ranking::totals(&view);

    println!();
    display::print_performance(&view, &totals);
    display::print_revenue_by_source(&report.revenue_by_source);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    println!("\nGenerating reports...");
    let tables = export::report_tables(&report, &view);
    export::write_csv_reports(output_dir, &tables)?;
    export::write_summary_json(&output_dir.join(constants::SUMMARY_JSON_FILENAME), &report.summary)?;
    if xlsx {
        export::write_workbook(&output_dir.join(constants::WORKBOOK_FILENAME), &tables)?;
    }

    println!("\nReports written to {}", output_dir.display());
    Ok(())
}

fn run_rankings(
    file_config: &FileConfig,
    inputs: &Inputs,
    filter: &ReportFilter,
    by: Option<RankBy>,
    top: usize,
) -> Result<()> {
    let Some(report) = load_and_build(file_config, inputs)? else {
        return Ok(());
    };

    let rankings = match by {
        Some(by) => vec![by],
        None => vec![RankBy::Revenue, RankBy::Roas, RankBy::Combined],
    };

    for by in rankings {
        let ranked = ranking::rank(&report.performance, by, filter, top);
        display::print_ranking(by, &ranked);
    }

    Ok(())
}

/// Load both inputs and build the report. `None` means there was nothing to report.
fn load_and_build(file_config: &FileConfig, inputs: &Inputs) -> Result<Option<LineItemReport>> {
    println!("Loading transactions...");
    let transactions = loaders::load_transactions(&inputs.transactions, &file_config.loader)?;
    println!("  {} unique transactions\n", transactions.len());

    println!("Loading lookup {}...", inputs.lookup.display());
    let lookup = loaders::load_lookup(&inputs.lookup, &file_config.loader)?;
    println!("  {} line items\n", lookup.len());

    let report = build_report(&transactions, &lookup, &file_config.extraction.line_item_field);
    if report.is_none() {
        println!("No usable data: no transaction references a line item.");
    }
    Ok(report)
}
