//! sqlask CLI
//!
//! Ask an SQLite database questions in plain language.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlask::llm::ExtractionPolicy;
use sqlask::query::QueryExecutor;
use sqlask::{
    AccessMode, Config, DatabaseHandle, GeneratedQuery, Pipeline, ProviderKind, QueryResult,
    TurnOutcome,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// sqlask - natural language questions over SQLite
#[derive(Parser)]
#[command(name = "sqlask")]
#[command(about = "Ask an SQLite database questions in plain language", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.sqlask/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question against a database
    Ask {
        /// Database file
        #[arg(long, env = "SQLASK_DB")]
        db: PathBuf,

        /// Question in natural language
        question: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Reject statements that would modify the database
        #[arg(long)]
        read_only: bool,

        /// Unwrap fences and cut at the first statement instead of the first line
        #[arg(long)]
        single_statement: bool,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Provider override (groq, openai, anthropic, mock)
        #[arg(long)]
        provider: Option<ProviderKind>,
    },

    /// Print the schema description the model sees
    Schema {
        /// Database file
        #[arg(long, env = "SQLASK_DB")]
        db: PathBuf,
    },

    /// Run a statement directly
    Sql {
        /// Database file
        #[arg(long, env = "SQLASK_DB")]
        db: PathBuf,

        /// SQL statement
        statement: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Reject statements that would modify the database
        #[arg(long)]
        read_only: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr).with_ansi(true));
    let json_layer = json.then(|| fmt::layer().with_writer(std::io::stderr).json());

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ask {
            db,
            question,
            format,
            read_only,
            single_statement,
            model,
            provider,
        } => {
            let mut config = config;
            if let Some(model) = model {
                config.model = model;
            }
            if provider.is_some() {
                config.provider = provider;
            }
            if read_only {
                config.access_mode = AccessMode::ReadOnly;
            }
            if single_statement {
                config.extraction = ExtractionPolicy::SingleStatement;
            }
            cmd_ask(&config, &db, &question, format).await
        }
        Commands::Schema { db } => cmd_schema(&db),
        Commands::Sql {
            db,
            statement,
            format,
            read_only,
        } => {
            let mode = if read_only {
                AccessMode::ReadOnly
            } else {
                config.access_mode
            };
            cmd_sql(&db, &statement, mode, format)
        }
        Commands::Config(ConfigCommands::Show) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(ConfigCommands::Init { force }) => {
            cmd_config_init(cli.config.as_deref(), force)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
        None => Config::load().context("Failed to load config"),
    }
}

fn open_database(path: &Path) -> Result<DatabaseHandle> {
    DatabaseHandle::open(path).with_context(|| format!("Cannot open database {}", path.display()))
}

async fn cmd_ask(config: &Config, db: &Path, question: &str, format: OutputFormat) -> Result<ExitCode> {
    let handle = open_database(db)?;
    let model = sqlask::llm::from_config(config).context("Failed to create model client")?;
    let pipeline = Pipeline::new(model, config.pipeline_options());

    let outcome = pipeline.run_turn(&handle, question).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => match &outcome {
            TurnOutcome::Answered(report) => {
                println!("{} {}", "→".cyan(), report.sql.as_str().dimmed());
                print_rows(&report.result);
                println!("\n{}", report.answer);
            }
            TurnOutcome::Failed(failure) => {
                if let Some(sql) = &failure.sql {
                    eprintln!("{} {}", "→".cyan(), sql.as_str().dimmed());
                }
                eprintln!("{} {}", "✗".red(), failure);
            }
        },
    }

    Ok(if outcome.is_answered() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_schema(db: &Path) -> Result<ExitCode> {
    let handle = open_database(db)?;
    let schema = sqlask::schema::introspect(&handle)?;
    if schema.is_empty() {
        println!("{}", "No user tables".yellow());
    } else {
        println!("{}", schema);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_sql(db: &Path, statement: &str, mode: AccessMode, format: OutputFormat) -> Result<ExitCode> {
    let handle = open_database(db)?;
    let result = QueryExecutor::new(&handle)
        .with_access_mode(mode)
        .execute(&GeneratedQuery::new(statement))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_rows(&result),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_init(path: Option<&Path>, force: bool) -> Result<ExitCode> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_file()?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save_to(&path)?;
    println!("{} Config written: {}", "✓".green(), path.display());
    Ok(ExitCode::SUCCESS)
}

fn print_rows(result: &QueryResult) {
    if result.is_empty() {
        println!("{}", "No rows".yellow());
        return;
    }

    println!("{}", result.columns.join(" | ").bold());
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", cells.join(" | "));
    }
    println!("{}", format!("({} rows)", result.len()).dimmed());
}
