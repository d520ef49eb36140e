// timetable-export: Render class schedules as a PDF or CSV timetable

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use timetable_export::{
    AssetCache, Branding, ExportError, ExportFormat, ExportOutcome, ExportPrompt, ExportRequest,
    Exporter, ScheduleRecord, UserInfo,
};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Render class schedules as a PDF or CSV timetable")]
struct Args {
    /// Schedule list (JSON array of schedule records)
    #[arg(short, long)]
    schedules: PathBuf,

    /// Display name of the exporting user
    #[arg(short, long)]
    name: Option<String>,

    /// Profile picture (file path or URL) shown in the info box
    #[arg(long)]
    avatar: Option<String>,

    /// Output format; asks interactively when omitted
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// One page layout per section instead of a single combined timetable
    #[arg(long)]
    all_sections: bool,

    /// Export date (YYYY-MM-DD format, defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    /// Directory the file is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Filename stem (defaults to the section name)
    #[arg(long)]
    base_name: Option<String>,

    /// Branding file (TOML) with institution names and logo paths
    #[arg(long)]
    branding: Option<PathBuf>,

    /// Log layout decisions
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TIMETABLE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // A second subscriber only happens under test harnesses; keep the first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<(), ExportError> {
    let export_date = parse_date(&args.date)?;
    let records = load_schedules(&args.schedules)?;

    let branding = match &args.branding {
        Some(path) => Branding::load(path)?,
        None => Branding::default(),
    };
    let cache = AssetCache::new(branding.assets.clone());
    let exporter = Exporter::new(&branding, &cache, &args.output_dir);

    let user = UserInfo {
        name: args.name,
        profile_picture: args.avatar,
    };
    let request = ExportRequest {
        records: &records,
        user: &user,
        multi_section: args.all_sections,
        export_date,
        base_name: args.base_name,
    };

    let outcome = match args.format {
        Some(format) => Some(exporter.export(format, &request)?),
        None => {
            let stdin = io::stdin();
            let mut prompt = ExportPrompt::new(stdin.lock(), io::stdout());
            prompt.run(&exporter, &request)?
        }
    };

    match outcome {
        Some(outcome) => print_summary(&outcome),
        None => println!("Export cancelled"),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, ExportError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ExportError::Date(s.clone())),
        None => Ok(Local::now().date_naive()),
    }
}

fn load_schedules(path: &Path) -> Result<Vec<ScheduleRecord>, ExportError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ExportError::Input(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| ExportError::Input(format!("Invalid JSON: {}", e)))
}

fn print_summary(outcome: &ExportOutcome) {
    println!("✓ Generated: {}", outcome.path.display());
    println!("  Sections: {}", outcome.sections.join(", "));
    if let Some(pages) = outcome.pages {
        println!("  Pages: {}", pages);
    }
    for warning in outcome.diagnostics.warnings() {
        println!("  Skipped: {} ({})", warning.record, warning.issue);
    }
}
