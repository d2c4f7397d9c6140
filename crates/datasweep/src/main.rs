//! CLI entry point for the data cleaning agent.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use datasweep::{AgentConfig, CleaningAgent, DuplicateKeep, report};
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[cfg(feature = "ai")]
use datasweep::oracle::{OpenAiConfig, OpenAiOracle};
#[cfg(feature = "ai")]
use std::env;
#[cfg(feature = "ai")]
use std::sync::Arc;

/// CLI-compatible duplicate-keep strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDuplicateKeep {
    /// Keep the first occurrence of each duplicate group
    First,
    /// Keep the last occurrence of each duplicate group
    Last,
}

impl From<CliDuplicateKeep> for DuplicateKeep {
    fn from(cli: CliDuplicateKeep) -> Self {
        match cli {
            CliDuplicateKeep::First => DuplicateKeep::First,
            CliDuplicateKeep::Last => DuplicateKeep::Last,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Agent-driven cleaning for tabular data",
    long_about = "Inspects a CSV file, plans a sequence of cleaning operations, executes\n\
                  them, and scores the result.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  OPENAI_API_KEY    API key for the planning/scoring oracle (AI mode)\n\n\
                  EXAMPLES:\n  \
                  # Clean a file with rule-based planning\n  \
                  datasweep -i data.csv --no-ai\n\n  \
                  # Clean with AI-delegated planning and write the result\n  \
                  datasweep -i data.csv -o cleaned.csv\n\n  \
                  # Machine-readable report on stdout\n  \
                  datasweep -i data.csv --json | jq .quality_score"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: String,

    /// Path to write the cleaned CSV to
    ///
    /// If not specified, only the report is produced
    #[arg(short, long)]
    output: Option<String>,

    /// Write the JSON report to this path
    #[arg(short = 'r', long)]
    report: Option<String>,

    /// Output the JSON report to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout contains only the report
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Disable AI-delegated planning and scoring (use rules only)
    #[arg(long, default_value = "false")]
    no_ai: bool,

    /// Missing-fraction threshold at or above which columns are dropped (0.0 - 1.0)
    #[arg(long, default_value = "0.5")]
    missing_threshold: f64,

    /// Expected fraction of outlier rows (0.0 - 0.5)
    #[arg(long, default_value = "0.05")]
    contamination: f64,

    /// Number of neighbors for KNN imputation
    #[arg(long, default_value = "5")]
    knn_neighbors: usize,

    /// Which occurrence to keep when removing duplicates
    #[arg(long, value_enum, default_value = "first")]
    keep: CliDuplicateKeep,

    /// Remove outlier rows instead of only flagging them
    #[arg(long, default_value = "false")]
    remove_outliers: bool,

    /// Maximum number of plan steps executed in one run
    #[arg(long, default_value = "5")]
    max_iterations: usize,

    /// Seed for the outlier detection RNG
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Timeout in seconds for each oracle call
    #[arg(long, default_value = "30")]
    oracle_timeout: u64,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging stays disabled so stdout only
/// contains the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded: {:?}", data.shape());

    let config = AgentConfig::builder()
        .missing_value_threshold(args.missing_threshold)
        .outlier_contamination(args.contamination)
        .knn_neighbors(args.knn_neighbors)
        .duplicate_keep(args.keep.into())
        .remove_outliers(args.remove_outliers)
        .max_iterations(args.max_iterations)
        .random_seed(args.seed)
        .oracle_timeout_secs(args.oracle_timeout)
        .use_delegated_planner(!args.no_ai)
        .use_delegated_validator(!args.no_ai)
        .build()?;

    let agent = build_agent(&args, config)?;

    let outcome = match agent.run(&data) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Cleaning run failed: {}", e);
            return Err(anyhow!("Cleaning run failed: {}", e));
        }
    };

    if let Some(ref output) = args.output {
        write_csv(&outcome.dataset, output)?;
        info!("Cleaned dataset written to: {}", output);
    }

    if let Some(ref report_path) = args.report {
        std::fs::write(report_path, serde_json::to_string_pretty(&outcome.report)?)?;
        info!("Report written to: {}", report_path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        println!("{}", report::render_text(&outcome.report));
    }

    Ok(())
}

/// Build the agent with an oracle when AI mode is on and a key is present.
#[cfg(feature = "ai")]
fn build_agent(args: &Args, config: AgentConfig) -> Result<CleaningAgent> {
    if args.no_ai {
        info!("Running in rule-based mode (AI disabled)");
        return build_agent_without_ai(config);
    }

    let api_key = env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
        warn!("OPENAI_API_KEY not set. Falling back to rule-based planning and scoring.");
        String::new()
    });

    if api_key.is_empty() {
        return build_agent_without_ai(config);
    }

    info!("Running with AI-delegated planning and scoring");

    let oracle_config = OpenAiConfig::builder()
        .timeout_secs(config.oracle_timeout_secs)
        .build();
    let oracle = Arc::new(OpenAiOracle::with_config(api_key, oracle_config)?);

    Ok(CleaningAgent::builder()
        .config(config)
        .oracle(oracle)
        .build()?)
}

/// Build the agent without AI support (fallback when "ai" feature is disabled)
#[cfg(not(feature = "ai"))]
fn build_agent(args: &Args, config: AgentConfig) -> Result<CleaningAgent> {
    if !args.no_ai {
        warn!("AI support not compiled in. Using rule-based mode.");
        warn!("Compile with --features ai to enable AI support.");
    }
    build_agent_without_ai(config)
}

/// Build a rule-based agent, forcing the delegated strategies off.
fn build_agent_without_ai(config: AgentConfig) -> Result<CleaningAgent> {
    let config = AgentConfig {
        use_delegated_planner: false,
        use_delegated_validator: false,
        ..config
    };

    Ok(CleaningAgent::builder().config(config).build()?)
}

/// Write a DataFrame to a CSV file.
fn write_csv(df: &DataFrame, path: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}

/// Load CSV with multiple fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            use std::io::Cursor;
            let cursor = Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(100))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Clean CSV content
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
