//! Folio CLI - Run and print catalog reports
//!
//! Usage:
//!   folio renderers | queries | reports
//!   folio refresh-query <query>
//!   folio preview <report>
//!   folio print <report> [--out <file.html>]
//!   folio validate <report>
//!
//! Examples:
//!   folio --config ./folio.toml reports
//!   folio print "Monthly Sales" --out sales.html

use clap::{Parser, Subcommand};
use folio::config::Settings;
use folio::materialize::{materialize, refresh_query};
use folio::model::Report;
use folio::paginate::TextMeasurer;
use folio::runner::{self, QueryRunner};
use folio::store::{JsonFileStore, Repository};
use folio::validation::validate_report;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - SQL-backed reports with custom cell renderers and print pagination")]
#[command(version)]
struct Cli {
    /// Path to a folio.toml (defaults to the standard lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List renderers
    Renderers,

    /// List queries
    Queries,

    /// List reports
    Reports,

    /// Run a query and rebuild its column list
    RefreshQuery {
        /// Query id or name
        query: String,
    },

    /// Print a report's filtered, rendered records as JSON
    Preview {
        /// Report id or name
        report: String,
    },

    /// Paginate a report and write printable HTML
    Print {
        /// Report id or name
        report: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate a report without running it
    Validate {
        /// Report id or name
        report: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut repo = match open_repository(&settings) {
        Ok(repo) => repo,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Renderers => cmd_renderers(&repo),
        Commands::Queries => cmd_queries(&repo),
        Commands::Reports => cmd_reports(&repo),
        Commands::RefreshQuery { query } => cmd_refresh_query(&settings, &mut repo, &query).await,
        Commands::Preview { report } => cmd_preview(&settings, &repo, &report).await,
        Commands::Print { report, out } => cmd_print(&settings, &repo, &report, out).await,
        Commands::Validate { report } => cmd_validate(&repo, &report),
    }
}

fn open_repository(settings: &Settings) -> Result<Repository<JsonFileStore>, String> {
    let path = settings
        .store
        .resolved_path()
        .map_err(|e| format!("Configuration error: {}", e))?;
    Repository::open(JsonFileStore::new(&path))
        .map_err(|e| format!("Error loading catalog '{}': {}", path.display(), e))
}

fn open_runner(settings: &Settings) -> Option<Box<dyn QueryRunner>> {
    match runner::from_settings(&settings.database) {
        Ok(runner) => Some(runner),
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            None
        }
    }
}

fn find_report<'a>(repo: &'a Repository<JsonFileStore>, name: &str) -> Option<&'a Report> {
    let report = repo.catalog().find_report(name);
    if report.is_none() {
        eprintln!("Report '{}' not found", name);
    }
    report
}

fn cmd_renderers(repo: &Repository<JsonFileStore>) -> ExitCode {
    let renderers = &repo.catalog().renderers;
    if renderers.is_empty() {
        println!("No renderers defined.");
        return ExitCode::SUCCESS;
    }
    println!("Renderers:");
    for r in renderers {
        println!("  - {} [{}] {} ({})", r.id, r.type_of, r.name, r.description);
    }
    ExitCode::SUCCESS
}

fn cmd_queries(repo: &Repository<JsonFileStore>) -> ExitCode {
    let queries = &repo.catalog().queries;
    if queries.is_empty() {
        println!("No queries defined.");
        return ExitCode::SUCCESS;
    }
    println!("Queries:");
    for q in queries {
        println!(
            "  - {} {} ({} of {} columns enabled)",
            q.id,
            q.name,
            q.enabled_columns().count(),
            q.columns.len()
        );
    }
    ExitCode::SUCCESS
}

fn cmd_reports(repo: &Repository<JsonFileStore>) -> ExitCode {
    let catalog = repo.catalog();
    if catalog.reports.is_empty() {
        println!("No reports defined.");
        return ExitCode::SUCCESS;
    }
    println!("Reports:");
    for r in &catalog.reports {
        let query = catalog
            .query(&r.query_id)
            .map(|q| q.name.as_str())
            .unwrap_or("<missing query>");
        println!(
            "  - {} {} (query: {}, {} {})",
            r.id,
            r.name,
            query,
            r.paper_size,
            if r.is_landscape { "landscape" } else { "portrait" }
        );
    }
    ExitCode::SUCCESS
}

async fn cmd_refresh_query(
    settings: &Settings,
    repo: &mut Repository<JsonFileStore>,
    name: &str,
) -> ExitCode {
    let Some(mut query) = repo.catalog().find_query(name).cloned() else {
        eprintln!("Query '{}' not found", name);
        return ExitCode::FAILURE;
    };
    let Some(runner) = open_runner(settings) else {
        return ExitCode::FAILURE;
    };

    let result = match refresh_query(&mut query, runner.as_ref()).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error running query: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for column in &query.columns {
        println!(
            "  {} {} {}",
            if column.enabled { "[x]" } else { "[ ]" },
            column.key,
            column.source_type
        );
    }
    println!("{} rows", result.record_set.len());

    match repo.save_query(query) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error saving query: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_preview(settings: &Settings, repo: &Repository<JsonFileStore>, name: &str) -> ExitCode {
    let Some(report) = find_report(repo, name) else {
        return ExitCode::FAILURE;
    };
    let Some(runner) = open_runner(settings) else {
        return ExitCode::FAILURE;
    };

    let materialized =
        match materialize(report, repo.catalog(), runner.as_ref(), settings.render.limits()).await {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };

    match serde_json::to_string_pretty(&materialized) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error encoding preview: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_print(
    settings: &Settings,
    repo: &Repository<JsonFileStore>,
    name: &str,
    out: Option<PathBuf>,
) -> ExitCode {
    let Some(report) = find_report(repo, name) else {
        return ExitCode::FAILURE;
    };
    let Some(runner) = open_runner(settings) else {
        return ExitCode::FAILURE;
    };

    let measurer = TextMeasurer::from(&settings.print);
    let job = match materialize(report, repo.catalog(), runner.as_ref(), settings.render.limits())
        .await
        .and_then(|m| m.print_job(report, &measurer))
    {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let html = job.render_html();
    match out {
        Some(path) => {
            if let Err(e) = fs::write(&path, html) {
                eprintln!("Error writing '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
            println!("Wrote {} pages to {}", job.page_count(), path.display());
        }
        None => print!("{}", html),
    }
    ExitCode::SUCCESS
}

fn cmd_validate(repo: &Repository<JsonFileStore>, name: &str) -> ExitCode {
    let Some(report) = find_report(repo, name) else {
        return ExitCode::FAILURE;
    };

    match validate_report(report, &repo.catalog().queries) {
        Ok(()) => {
            println!("OK: report '{}' is valid", report.name);
            ExitCode::SUCCESS
        }
        Err(errors) => {
            eprintln!("Validation errors:");
            for line in errors.to_string().split("; ") {
                eprintln!("  - {}", line);
            }
            ExitCode::FAILURE
        }
    }
}
