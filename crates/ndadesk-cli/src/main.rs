mod display;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ndadesk_core::kpi::{band_distribution, calculate_kpis, mean_quality};
use ndadesk_core::screen::{DocumentScreener, check_compliance};
use ndadesk_core::{DeskConfig, EmailMessage, QualityReport, ReviewThread, ThreadIntake, parse};
use ndadesk_store::quality_columns::{count_below, mean_score_by};
use ndadesk_store::{
    ParquetSnapshot, QualityFilter, SnapshotStore, annotate_batches, filter_by_quality,
    threads_to_batch,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ndadesk")]
#[command(version, about = "NDA review desk: score checker annotations and track review threads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON desk config; defaults apply when omitted
    #[arg(long, global = true, env = "NDADESK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one quality annotation and print its report
    Score {
        /// Annotation text; read from stdin when omitted
        text: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Treat each input line as a separate annotation and summarize
        #[arg(long)]
        lines: bool,
    },
    /// Append quality columns to every row of a Parquet file
    Annotate {
        input: PathBuf,
        output: PathBuf,

        /// Column holding the checker annotations
        #[arg(long, default_value = ndadesk_core::review::ANNOTATION_COLUMN)]
        column: String,
    },
    /// Keep annotated rows within a score/issue range
    Filter {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value_t = 0)]
        min_score: u32,

        #[arg(long, default_value_t = 100)]
        max_score: u32,

        #[arg(long, default_value_t = 0)]
        min_issues: u32,

        /// Print the kept rows
        #[arg(long)]
        show: bool,
    },
    /// Mean quality score per group of an annotated Parquet file
    Summary {
        input: PathBuf,

        /// Column to group rows by (e.g. client)
        #[arg(long)]
        group_by: String,
    },
    /// Open review threads for a JSON array of emails
    Intake {
        emails: PathBuf,

        /// Threads JSON, or Parquet when the extension is .parquet
        output: PathBuf,
    },
    /// Dashboard KPIs for a JSON array of review threads
    Kpis { threads: PathBuf },
    /// Quick screen of raw document text files
    Screen {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("ndadesk v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => DeskConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DeskConfig::default(),
    };

    match cli.command {
        Commands::Score { text, json, lines } => cmd_score(&config, text, json, lines),
        Commands::Annotate {
            input,
            output,
            column,
        } => cmd_annotate(&input, &output, &column),
        Commands::Filter {
            input,
            output,
            min_score,
            max_score,
            min_issues,
            show,
        } => {
            let filter = QualityFilter {
                min_score,
                max_score,
                min_issues,
            };
            cmd_filter(&input, &output, &filter, show)
        }
        Commands::Summary { input, group_by } => cmd_summary(&config, &input, &group_by),
        Commands::Intake { emails, output } => cmd_intake(&config, &emails, &output),
        Commands::Kpis { threads } => cmd_kpis(&config, &threads),
        Commands::Screen { files } => cmd_screen(&config, &files),
    }
}

fn cmd_score(
    config: &DeskConfig,
    text: Option<String>,
    json: bool,
    lines: bool,
) -> anyhow::Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading annotation from stdin")?;
            buf
        }
    };

    if lines {
        let reports: Vec<QualityReport> = text.lines().map(|l| parse(Some(l))).collect();
        if json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
            return Ok(());
        }
        let flagged = reports.iter().filter(|r| config.needs_rework(r)).count();
        println!("  {:<26} {}", "annotations", reports.len());
        if let Some(mean) = mean_quality(&reports) {
            println!("  {:<26} {:.1}", "mean score", mean);
        }
        println!("  {:<26} {}", "below threshold", flagged);
        for (band, n) in band_distribution(&reports) {
            println!("  {:<26} {}", band.as_str(), n);
        }
        return Ok(());
    }

    let report = parse(Some(text.trim_end_matches(['\r', '\n'])));
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display::print_report_card(&report);
        if config.needs_rework(&report) {
            println!(
                "Below quality threshold ({}): flagged for rework.",
                config.quality_threshold
            );
        }
    }
    Ok(())
}

fn cmd_annotate(input: &Path, output: &Path, column: &str) -> anyhow::Result<()> {
    let batches = ParquetSnapshot::new(input)
        .load()
        .with_context(|| format!("reading {}", input.display()))?;
    let annotated = annotate_batches(&batches, column).context("scoring annotations")?;
    if annotated.is_empty() {
        bail!("{} contains no row groups", input.display());
    }
    ParquetSnapshot::new(output)
        .save(&annotated)
        .with_context(|| format!("writing {}", output.display()))?;

    let rows: usize = annotated.iter().map(|b| b.num_rows()).sum();
    eprintln!("Annotated {rows} rows -> {}", output.display());
    Ok(())
}

fn cmd_filter(
    input: &Path,
    output: &Path,
    filter: &QualityFilter,
    show: bool,
) -> anyhow::Result<()> {
    let batches = ParquetSnapshot::new(input)
        .load()
        .with_context(|| format!("reading {}", input.display()))?;
    let kept = batches
        .iter()
        .map(|b| filter_by_quality(b, filter))
        .collect::<Result<Vec<_>, _>>()
        .context("filtering rows")?;
    if kept.is_empty() {
        bail!("{} contains no row groups", input.display());
    }
    ParquetSnapshot::new(output)
        .save(&kept)
        .with_context(|| format!("writing {}", output.display()))?;

    if show {
        arrow::util::pretty::print_batches(&kept).context("printing rows")?;
    }
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    let rows: usize = kept.iter().map(|b| b.num_rows()).sum();
    eprintln!("Kept {rows} of {total} rows -> {}", output.display());
    Ok(())
}

fn cmd_summary(config: &DeskConfig, input: &Path, group_by: &str) -> anyhow::Result<()> {
    let batches = ParquetSnapshot::new(input)
        .load()
        .with_context(|| format!("reading {}", input.display()))?;
    let groups = mean_score_by(&batches, group_by).context("aggregating scores")?;
    display::print_group_scores(group_by, &groups);

    let flagged = count_below(&batches, config.quality_threshold)?;
    println!(
        "  {:<26} {}",
        format!("below {}", config.quality_threshold),
        flagged
    );
    if config.enable_alerts && flagged > 0 {
        warn!(
            flagged,
            threshold = config.quality_threshold,
            "documents below quality threshold"
        );
    }
    Ok(())
}

fn cmd_intake(config: &DeskConfig, emails: &Path, output: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(emails)
        .with_context(|| format!("reading {}", emails.display()))?;
    let messages: Vec<EmailMessage> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", emails.display()))?;

    let now = Utc::now();
    let mut intake = ThreadIntake::new(config);
    let threads: Vec<ReviewThread> = messages.iter().map(|m| intake.process(m, now)).collect();

    if output.extension().is_some_and(|e| e == "parquet") {
        let batch = threads_to_batch(&threads).context("building thread batch")?;
        ParquetSnapshot::new(output)
            .save(&[batch])
            .with_context(|| format!("writing {}", output.display()))?;
    } else {
        std::fs::write(output, serde_json::to_string_pretty(&threads)?)
            .with_context(|| format!("writing {}", output.display()))?;
    }
    eprintln!(
        "Opened {} threads -> {}",
        intake.processed_count(),
        output.display()
    );
    Ok(())
}

fn cmd_kpis(config: &DeskConfig, threads: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(threads)
        .with_context(|| format!("reading {}", threads.display()))?;
    let threads: Vec<ReviewThread> =
        serde_json::from_str(&raw).context("parsing review threads")?;

    let now = Utc::now();
    let kpis = calculate_kpis(&threads, now);
    display::print_kpis(&kpis);
    display::print_threads(&threads, config.max_threads_display, now);
    if config.enable_alerts && kpis.overdue > 0 {
        warn!(overdue = kpis.overdue, "review threads past SLA");
    }
    Ok(())
}

fn cmd_screen(config: &DeskConfig, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut screener = DocumentScreener::new();
    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let screen = screener.screen(&content);
        let compliant = check_compliance(&content, &config.compliance_sections);
        display::print_screen(&path.display().to_string(), &screen, compliant);
    }
    info!(documents = screener.analyzed_count(), "screened documents");
    Ok(())
}
