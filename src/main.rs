//! # Motorlot CLI (`lot`)
//!
//! ## Usage
//!
//! ```bash
//! lot --config ./config/lot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lot init` | Create the database, run migrations, seed sample inventory |
//! | `lot search [filters]` | Search the inventory |
//! | `lot suggest <query>` | Print autocomplete suggestions |
//! | `lot history` | Show recent searches and summary stats |
//! | `lot history-clear` | Delete all search history |
//! | `lot serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! lot init --config ./config/lot.toml
//! lot search --q camry
//! lot search --classification 2 --min-year 2020 --color Black
//! lot serve
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorlot::motorlot_core::params::ALL;
use motorlot::motorlot_core::RawSearchParams;
use motorlot::{config, history, migrate, search, server};

/// Motorlot CLI: faceted search over a dealership's vehicle inventory.
#[derive(Parser)]
#[command(name = "lot", about = "Faceted vehicle inventory search", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables, then
    /// inserts the sample inventory. Safe to run repeatedly.
    Init {
        /// Skip inserting the sample classifications and vehicles.
        #[arg(long)]
        no_seed: bool,
    },

    /// Search the inventory.
    ///
    /// Filters are passed through the same validation as the web form, so
    /// `--min-price abc` is rejected with the same message.
    Search {
        /// Free text matched against make, model, description, and year.
        #[arg(long)]
        q: Option<String>,

        /// Classification id, or `all`.
        #[arg(long)]
        classification: Option<String>,

        #[arg(long)]
        min_price: Option<String>,

        #[arg(long)]
        max_price: Option<String>,

        #[arg(long)]
        min_miles: Option<String>,

        #[arg(long)]
        max_miles: Option<String>,

        #[arg(long)]
        min_year: Option<String>,

        #[arg(long)]
        max_year: Option<String>,

        /// Exact color, or `all`.
        #[arg(long)]
        color: Option<String>,
    },

    /// Print autocomplete suggestions for a partial query.
    Suggest { query: String },

    /// Show recent searches, summary stats, and popular queries.
    History {
        /// Number of recent searches to show.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Delete all recorded search history.
    HistoryClear,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,motorlot=debug,tower_http=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init { no_seed } => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
            if !no_seed {
                let inserted = migrate::seed_sample_inventory(&cfg).await?;
                println!("Seeded {} sample vehicles.", inserted);
            }
        }
        Commands::Search {
            q,
            classification,
            min_price,
            max_price,
            min_miles,
            max_miles,
            min_year,
            max_year,
            color,
        } => {
            let raw = RawSearchParams {
                q: q.unwrap_or_default(),
                classification_id: classification.unwrap_or_else(|| ALL.to_string()),
                min_price: min_price.unwrap_or_default(),
                max_price: max_price.unwrap_or_default(),
                min_miles: min_miles.unwrap_or_default(),
                max_miles: max_miles.unwrap_or_default(),
                min_year: min_year.unwrap_or_default(),
                max_year: max_year.unwrap_or_default(),
                color: color.unwrap_or_else(|| ALL.to_string()),
            };
            search::run_search(&cfg, &raw).await?;
        }
        Commands::Suggest { query } => {
            search::run_suggest(&cfg, &query).await?;
        }
        Commands::History { limit } => {
            history::run_history(&cfg, limit).await?;
        }
        Commands::HistoryClear => {
            history::run_clear(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
