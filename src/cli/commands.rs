//! Command implementations for the ivcurve CLI
//!
//! Each subcommand sets up its stage from the parsed arguments, runs it and
//! prints a colored summary. Library errors are wrapped with context here.

use anyhow::{Context, Result};
use colored::*;
use tracing::{debug, info};

use crate::analysis::analyze_dataset;
use crate::analysis::regions::{profile_frame, summary_frame};
use crate::cli::{AnalyzeArgs, Args, Commands, LoggerArgs, SplitArgs, SummarizeArgs};
use crate::config::{AnalysisConfig, LoggerConfig, ParserConfig, TracerConfig};
use crate::dataset::CalibrationDataset;
use crate::logger::{LoggerOutcome, LoggerProcessor};
use crate::models::ErrorStat;
use crate::processor::discovery::discover_inputs;
use crate::processor::writer::write_csv;
use crate::processor::{BatchProcessor, print_summary};
use crate::selection::{SplitOutcome, split_file};

/// Install logging and run the selected subcommand
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let show_progress = args.show_progress();
    match args.command {
        Commands::Summarize(summarize) => run_summarize(summarize, show_progress),
        Commands::Analyze(analyze) => run_analyze(analyze),
        Commands::Split(split) => run_split(split),
        Commands::Logger(logger) => run_logger(logger),
    }
}

/// Set up the tracing subscriber for the binary
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ivcurve_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to install log subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn run_summarize(args: SummarizeArgs, show_progress: bool) -> Result<()> {
    info!("Summarizing {} inputs into {}", args.inputs.len(), args.output_dir.display());

    let config = TracerConfig::default();
    config.validate().context("Invalid configuration")?;

    let outcome = BatchProcessor::new(args.output_dir.clone())
        .with_config(config)
        .with_progress(show_progress)
        .process(&args.inputs)
        .context("Batch parameter extraction failed")?;

    print_summary(&outcome.stats);
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = AnalysisConfig::default()
        .with_reference_unit(args.reference_units.into())
        .with_comparand_unit(args.comparand_units.into())
        .with_interpolation(args.interpolation.into());

    let dataset = CalibrationDataset::from_csv(&args.dataset)
        .with_context(|| format!("Failed to load calibration dataset {}", args.dataset.display()))?;
    let report = analyze_dataset(&dataset, &config).context("Calibration analysis failed")?;

    println!("\n{}", "Calibration Error Analysis".bright_green().bold());
    println!("  {} {}", "Dataset:".bright_cyan(), args.dataset.display());
    println!(
        "  {} {} reference, {} comparand",
        "Rows removed:".bright_cyan(),
        dataset.reference_dropped,
        dataset.comparand_dropped
    );

    let cleaning = &report.aligned.cleaning;
    if cleaning.removed_points() > 0 {
        println!(
            "  {} {} after reset, {} low-voltage spikes",
            "Reference points removed:".bright_yellow(),
            cleaning.truncated_points,
            cleaning.spike_points
        );
    }

    let points = &report.reference_points;
    println!(
        "  {} Voc {} V, Vmax {} V, Isc {} A, Pmax {} W",
        "Reference:".bright_cyan(),
        format_value(points.voc),
        format_value(points.vmax),
        format_value(points.isc),
        format_value(points.pmax)
    );
    let bounds = &report.bounds;
    println!(
        "  {} Voc {:.4} V (lowest current), Vmax {:.4} V, Isc {:.4} A",
        "Region bounds:".bright_cyan(),
        bounds.voc,
        bounds.vmax,
        bounds.isc
    );

    println!("\n  {:<10} {:>12} {:>12} {:>8}", "Metric", "Mean", "Max", "Count");
    for (name, stat) in report.profile.summary.rows() {
        println!("  {}", format_stat_row(name, stat));
    }
    if report.profile.summary.excluded_points > 0 {
        println!(
            "  {} {}",
            "Points with undefined error:".bright_yellow(),
            report.profile.summary.excluded_points
        );
    }

    if let Some(path) = &args.output {
        let mut df = summary_frame(&report.profile.summary)?;
        write_csv(&mut df, path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("  {} {}", "Wrote".bright_green(), path.display());
    }
    if let Some(path) = &args.points {
        let mut df = profile_frame(&report.profile)?;
        write_csv(&mut df, path)
            .with_context(|| format!("Failed to write error profile to {}", path.display()))?;
        println!("  {} {}", "Wrote".bright_green(), path.display());
    }
    Ok(())
}

fn run_split(args: SplitArgs) -> Result<()> {
    let outcome = split_file(
        &args.file,
        &args.modified,
        &args.unmodified,
        args.allow_overlap,
        &ParserConfig::default(),
    )
    .with_context(|| format!("Failed to split {}", args.file.display()))?;

    print_split_summary(&outcome);
    Ok(())
}

fn run_logger(args: LoggerArgs) -> Result<()> {
    let config = LoggerConfig::default().with_thresholds(args.lower, args.upper);
    config.validate().context("Invalid temperature band")?;

    let files = discover_inputs(&args.inputs).context("No logger files found")?;
    let mut outcome = LoggerProcessor::new(config)
        .combine_files(&files)
        .context("Failed to combine logger files")?;

    write_csv(&mut outcome.table.frame, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    print_logger_summary(&outcome, &args.output.display().to_string());
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

fn format_stat_row(name: &str, stat: Option<ErrorStat>) -> String {
    match stat {
        Some(stat) => format!(
            "{} {:>12.4} {:>12.4} {:>8}",
            format!("{:<10}", name).bright_cyan(),
            stat.mean,
            stat.max,
            stat.count
        ),
        None => format!(
            "{} {:>12} {:>12} {:>8}",
            format!("{:<10}", name).bright_cyan(),
            "-",
            "-",
            0
        ),
    }
}

fn print_split_summary(outcome: &SplitOutcome) {
    println!("\n{}", "Split Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Samples in file:".bright_cyan(),
        outcome.total_samples.to_string().bright_white()
    );
    println!(
        "  {} {} -> {}",
        "Modified:".bright_cyan(),
        outcome.modified_count.to_string().bright_white().bold(),
        outcome.modified_path.display()
    );
    println!(
        "  {} {} -> {}",
        "Unmodified:".bright_cyan(),
        outcome.unmodified_count.to_string().bright_white().bold(),
        outcome.unmodified_path.display()
    );
}

fn print_logger_summary(outcome: &LoggerOutcome, output: &str) {
    println!("\n{}", "Logger Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Files read:".bright_cyan(),
        outcome.files_read.to_string().bright_white()
    );
    if !outcome.failures.is_empty() {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            outcome.failures.len().to_string().bright_red().bold()
        );
        for (path, reason) in &outcome.failures {
            println!("    {} {}", path.display().to_string().red(), reason);
        }
    }
    println!(
        "  {} {}",
        "Rows:".bright_cyan(),
        outcome.table.frame.height().to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Rows removed:".bright_yellow(),
        outcome.table.rows_dropped
    );
    println!(
        "  {} {}",
        "Readings masked:".bright_yellow(),
        outcome.table.values_masked
    );
    println!("  {} {}", "Wrote".bright_green(), output);
}
