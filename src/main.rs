use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use resume_search::config::Config;
use resume_search::record::JsonRecordSource;
use resume_search::search::{
    CancellationToken, QueryError, QueryParser, SearchError, SearchManager, SearchOutcome,
    SearchSession,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{self, EnvFilter};

/// Characters of record text shown next to each match
const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Parser)]
#[command(
    name = "resume-search",
    version,
    about = "Filter resume records with boolean queries",
    after_help = "Examples:\n  resume-search -r resumes.json 'HuggingFace AND AWS'\n  resume-search -r resumes.jsonl '(Java OR Python) AND \"machine learning\"'"
)]
struct Cli {
    /// Boolean query: terms, "quoted phrases", AND, OR, parentheses
    query: String,

    /// JSON array or JSON Lines file with resume records
    #[arg(short, long)]
    records: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field holding the record id
    #[arg(long)]
    id_field: Option<String>,

    /// Field to search; repeat for several (default: every field)
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Worker threads for evaluation
    #[arg(short, long)]
    workers: Option<usize>,

    /// Do not match adjacent words written together (e.g. "machinelearning")
    #[arg(long)]
    no_merge_adjacent: bool,

    /// Keep ".NET" as "net" instead of "dotnet"
    #[arg(long)]
    no_dotnet: bool,

    /// Print a JSON report instead of one id per line
    #[arg(long)]
    json: bool,

    /// Show a preview of each matching record's text
    #[arg(long)]
    show_text: bool,
}

#[derive(Debug, Serialize)]
struct SearchReport {
    query: String,
    searched_at: DateTime<Utc>,
    total: usize,
    evaluated: usize,
    matched: usize,
    cancelled: bool,
    results: Vec<ReportEntry>,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    id: String,
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(SearchError::Query(query_error)) = err.downcast_ref::<SearchError>() {
                eprintln!("{}", describe_query_error(query_error));
                return ExitCode::from(2);
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    // Reject a malformed query before reading any records
    QueryParser::parse(&cli.query).map_err(SearchError::from)?;

    tracing::info!("Searching {:?} for `{}`", cli.records, cli.query);

    let source = JsonRecordSource::with_config(&cli.records, config.clone());
    let manager = SearchManager::new(&config)?;
    let session = Arc::new(SearchSession::load(&source, manager).await?);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping search");
                cancel.cancel();
            }
        })
    };

    let outcome = {
        let session = Arc::clone(&session);
        let cancel = cancel.clone();
        let query = cli.query.clone();
        tokio::task::spawn_blocking(move || session.search_with_cancel(&query, &cancel))
            .await
            .context("Search task failed")??
    };
    interrupt.abort();

    if outcome.cancelled {
        tracing::warn!(
            "Partial results: {}/{} records evaluated",
            outcome.evaluated,
            outcome.total
        );
    }

    if cli.json {
        let report = build_report(&cli, &session, &outcome);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &outcome.matches {
            match session.record(&result.id).filter(|_| cli.show_text) {
                Some(record) => println!("{}\t{}", result.id, record.preview(PREVIEW_CHARS)),
                None => println!("{}", result.id),
            }
        }
        eprintln!(
            "{} of {} records matched",
            outcome.matches.len(),
            outcome.total
        );
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(id_field) = &cli.id_field {
        config.id_field = id_field.clone();
    }
    if !cli.fields.is_empty() {
        config.text_fields = cli.fields.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.no_merge_adjacent {
        config.normalizer.merge_adjacent_words = false;
    }
    if cli.no_dotnet {
        config.normalizer.expand_dotnet = false;
    }

    config.validate()?;
    Ok(config)
}

fn build_report(cli: &Cli, session: &SearchSession, outcome: &SearchOutcome) -> SearchReport {
    let results = outcome
        .matches
        .iter()
        .map(|result| ReportEntry {
            id: result.id.clone(),
            matched: result.matched,
            text: session
                .record(&result.id)
                .filter(|_| cli.show_text)
                .map(|record| record.preview(PREVIEW_CHARS)),
        })
        .collect();

    SearchReport {
        query: cli.query.clone(),
        searched_at: Utc::now(),
        total: outcome.total,
        evaluated: outcome.evaluated,
        matched: outcome.matches.len(),
        cancelled: outcome.cancelled,
        results,
    }
}

/// Error text with a caret under the offending character
fn describe_query_error(error: &QueryError) -> String {
    match error {
        QueryError::EmptyQuery => "Please enter a search query.".to_string(),
        QueryError::Syntax {
            expression,
            position,
            kind,
        } => format!(
            "Invalid query: {kind}\n  {expression}\n  {}^",
            " ".repeat(*position)
        ),
    }
}
