//! pagesync CLI - web/PDF region synchronization tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagesync::{
    export_rows, ingest, to_csv, to_json, Band, JsonFormat, Source, SyncEngine, SyncInput,
    SyncOptions, SyncOutcome, SyncReport,
};

#[derive(Parser)]
#[command(name = "pagesync")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Synchronize OCR regions between rendered web pages and PDF pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair web regions with pdf regions and write a report
    Sync {
        /// Web regions JSON
        #[arg(long, value_name = "FILE")]
        web: PathBuf,

        /// Pdf regions JSON
        #[arg(long, value_name = "FILE")]
        pdf: PathBuf,

        /// Raw web words JSON (for propagation)
        #[arg(long, value_name = "FILE")]
        web_words: Option<PathBuf>,

        /// Raw pdf words JSON (for propagation)
        #[arg(long, value_name = "FILE")]
        pdf_words: Option<PathBuf>,

        /// Web region id to propagate (repeatable)
        #[arg(long, value_name = "ID")]
        web_template: Vec<String>,

        /// Pdf region id to propagate (repeatable)
        #[arg(long, value_name = "ID")]
        pdf_template: Vec<String>,

        /// Engine options JSON
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,

        /// Greedy acceptance threshold (overrides the options file)
        #[arg(long)]
        threshold: Option<f32>,

        /// Detect columns before matching
        #[arg(long)]
        columns: bool,

        /// Page number for regions without one
        #[arg(long, default_value = "1")]
        page: u32,

        /// Report format
        #[arg(long, value_enum, default_value = "json")]
        format: ReportFormat,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Find repetitions of a template region in raw OCR words
    Propagate {
        /// Regions JSON containing the template
        #[arg(long, value_name = "FILE")]
        regions: PathBuf,

        /// Raw words JSON
        #[arg(long, value_name = "FILE")]
        words: PathBuf,

        /// Template region id
        #[arg(long, value_name = "ID")]
        template: String,

        /// Side the regions belong to
        #[arg(long, value_enum, default_value = "pdf")]
        source: Side,

        /// Engine options JSON
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Score two strings
    Similarity {
        /// First text
        a: String,

        /// Second text
        b: String,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Full JSON report
    Json,
    /// One CSV row per region
    Csv,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Side {
    /// Web page regions
    Web,
    /// Pdf page regions
    Pdf,
}

impl From<Side> for Source {
    fn from(side: Side) -> Self {
        match side {
            Side::Web => Source::Web,
            Side::Pdf => Source::Pdf,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            web,
            pdf,
            web_words,
            pdf_words,
            web_template,
            pdf_template,
            options,
            threshold,
            columns,
            page,
            format,
            compact,
            output,
        } => {
            let args = SyncArgs {
                web,
                pdf,
                web_words,
                pdf_words,
                web_templates: web_template,
                pdf_templates: pdf_template,
                options,
                threshold,
                columns,
                page,
            };
            cmd_sync(args, format, json_format(compact), output.as_deref())
        }
        Commands::Propagate {
            regions,
            words,
            template,
            source,
            options,
            compact,
            output,
        } => cmd_propagate(
            &regions,
            &words,
            &template,
            source.into(),
            options.as_deref(),
            json_format(compact),
            output.as_deref(),
        ),
        Commands::Similarity { a, b } => {
            cmd_similarity(&a, &b);
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

struct SyncArgs {
    web: PathBuf,
    pdf: PathBuf,
    web_words: Option<PathBuf>,
    pdf_words: Option<PathBuf>,
    web_templates: Vec<String>,
    pdf_templates: Vec<String>,
    options: Option<PathBuf>,
    threshold: Option<f32>,
    columns: bool,
    page: u32,
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn load_options(path: Option<&Path>) -> Result<SyncOptions, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::debug!("Loading options from {}", path.display());
            let json = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&json)?)
        }
        None => {
            log::debug!("Using default options");
            Ok(SyncOptions::default())
        }
    }
}

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Ok(pb)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn build_input(args: &SyncArgs) -> Result<SyncInput, Box<dyn std::error::Error>> {
    let web = ingest::regions_from_path(Source::Web, args.page, &args.web)?;
    let pdf = ingest::regions_from_path(Source::Pdf, args.page, &args.pdf)?;

    let mut input = SyncInput::new(web, pdf);
    if let Some(path) = &args.web_words {
        input = input.with_web_words(ingest::words_from_path(path)?);
    }
    if let Some(path) = &args.pdf_words {
        input = input.with_pdf_words(ingest::words_from_path(path)?);
    }
    for id in &args.web_templates {
        input = input.with_web_template(id.clone());
    }
    for id in &args.pdf_templates {
        input = input.with_pdf_template(id.clone());
    }
    log::debug!(
        "Loaded {} web / {} pdf regions, {} template(s)",
        input.web.len(),
        input.pdf.len(),
        input.web_templates.len() + input.pdf_templates.len()
    );
    Ok(input)
}

fn cmd_sync(
    args: SyncArgs,
    format: ReportFormat,
    json_format: JsonFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = load_options(args.options.as_deref())?;
    if let Some(threshold) = args.threshold {
        options = options.with_threshold(threshold);
    }
    if args.columns {
        options = options.with_infer_columns(true);
    }

    let pb = spinner("Reading regions...")?;
    let input = build_input(&args)?;

    pb.set_message("Synchronizing...");
    let outcome = SyncEngine::new(options).run_input(input)?;
    pb.finish_and_clear();

    let content = match format {
        ReportFormat::Json => to_json(&SyncReport::from_outcome(&outcome), json_format)?,
        ReportFormat::Csv => to_csv(&export_rows(&outcome)),
    };

    if output.is_some() {
        print_summary(&outcome);
    }
    write_output(output, &content)
}

fn cmd_propagate(
    regions: &Path,
    words: &Path,
    template: &str,
    source: Source,
    options: Option<&Path>,
    format: JsonFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(options)?;
    let regions = ingest::regions_from_path(source, 1, regions)?;
    let words = ingest::words_from_path(words)?;

    let template_region = regions
        .iter()
        .find(|r| r.id == template)
        .ok_or_else(|| pagesync::Error::UnknownTemplate {
            side: source,
            id: template.to_string(),
        })?;

    let pb = spinner("Scanning words...")?;
    let result = SyncEngine::new(options).propagate(template_region, &words);
    pb.finish_and_clear();

    if result.degraded {
        eprintln!(
            "{} budget exhausted after {} hypotheses, results are partial",
            "Warning:".yellow().bold(),
            result.iterations
        );
    }

    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&result)?,
        JsonFormat::Compact => serde_json::to_string(&result)?,
    };
    if output.is_some() {
        println!(
            "{} {} candidate(s)",
            "Found".green().bold(),
            result.candidates.len()
        );
    }
    write_output(output, &json)
}

fn cmd_similarity(a: &str, b: &str) {
    let score = pagesync::similarity(a, b);
    let band = SyncOptions::default().bands.classify(score, true);
    let label = format!("{:.3}", score);
    let label = match band {
        Band::High => label.green(),
        Band::Mid => label.yellow(),
        Band::Low => label.truecolor(255, 152, 0),
        Band::Unmatched => label.red(),
    };
    println!("{} ({})", label.bold(), band);
}

fn print_summary(outcome: &SyncOutcome) {
    let stats = &outcome.stats;
    println!("{}", "Sync Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{}: {}/{} ({:.1}%)",
        "Matched".bold(),
        stats.matched_count,
        stats.total_web_regions,
        stats.sync_percent()
    );
    println!("{}: {}", "Pdf regions".bold(), stats.total_pdf_regions);
    println!(
        "{}: {} high, {} mid, {} low, {} unmatched",
        "Bands".bold(),
        stats.band_counts.high.to_string().green(),
        stats.band_counts.mid.to_string().yellow(),
        stats.band_counts.low,
        stats.band_counts.unmatched.to_string().red()
    );
    println!(
        "{}: {} anchored, {} optimized, {} propagated",
        "Stages".bold(),
        stats.anchor_count,
        stats.optimized_count,
        stats.propagated_count
    );
    if stats.propagation_degraded {
        println!("{}", "Propagation hit its budget; results are partial".yellow());
    }
}

fn cmd_version() {
    println!("{} {}", "pagesync".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Web/PDF region synchronization tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pagesync".dimmed());
    println!("License: MIT");
}
