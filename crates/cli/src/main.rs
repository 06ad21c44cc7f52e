use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod source;

use commands::FilterArgs;

#[derive(Parser, Debug)]
#[command(name = "kharcha", version, about = "Track spending from bank SMS messages")]
struct Cli {
    /// Config file (default: kharcha.toml in the platform data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct FilterOpts {
    /// Only this bank
    #[arg(long)]
    bank: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

impl FilterOpts {
    fn args(&self) -> FilterArgs {
        FilterArgs {
            bank: self.bank.clone(),
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import an exported inbox (CSV with body,sender,timestamp)
    Sync {
        csv: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Process one newly received message
    Ingest {
        #[arg(long)]
        sender: String,

        /// Arrival time, epoch millis or RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,

        body: String,
    },

    /// List stored transactions, newest first
    List(FilterOpts),

    /// List banks seen so far
    Banks,

    /// Spend and credit totals
    Totals(FilterOpts),

    /// Set a transaction's category (built-in name or your own label)
    Categorize { id: i64, category: String },

    /// Delete a transaction
    Delete { id: i64 },

    /// List categories available for selection
    Categories,

    /// Create a new user category
    AddCategory { label: String },

    /// Always file text containing PATTERN under CATEGORY
    Map { pattern: String, category: String },

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    if let Command::Config { command: ConfigCommand::Init } = cli.command {
        return config::init_config(&config_path);
    }

    let cfg = config::load_config(&config_path)?;
    if let Some(parent) = cfg.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let pool = kharcha_storage::create_db(&cfg.database_path)
        .await
        .with_context(|| format!("open database {}", cfg.database_path.display()))?;
    tracing::debug!(db = %cfg.database_path.display(), "database ready");

    match cli.command {
        Command::Sync { csv, json } => commands::sync(&pool, &cfg, &csv, json).await?,
        Command::Ingest { sender, at, body } => {
            commands::ingest(&pool, &cfg, body, sender, at).await?
        }
        Command::List(opts) => commands::list(&pool, &opts.args(), opts.json).await?,
        Command::Banks => commands::banks(&pool).await?,
        Command::Totals(opts) => commands::totals(&pool, &opts.args(), opts.json).await?,
        Command::Categorize { id, category } => commands::categorize(&pool, id, &category).await?,
        Command::Delete { id } => commands::delete(&pool, id).await?,
        Command::Categories => commands::categories(&pool).await?,
        Command::AddCategory { label } => commands::add_category(&pool, &label).await?,
        Command::Map { pattern, category } => commands::map(&pool, &pattern, &category).await?,
        Command::Config { .. } => {}
    }

    pool.close().await;
    Ok(())
}
