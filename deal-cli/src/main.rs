use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deal_core::{EngineConfig, ListingId, Property, PropertyRepository};
use deal_data::{normalize_zip, parse_unit_mix};
use rust_decimal::Decimal;

use deal_cli::config::AppConfig;
use deal_cli::{app, logging, render};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Multi-family deal underwriting.
///
/// Analyzes stored listings against market rents and financing defaults,
/// and runs interactive edit sessions whose overrides are saved as you go.
#[derive(Debug, Parser)]
#[command(name = "deal", version)]
struct Cli {
    /// Database backend to use. Overrides the config file.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `deals.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// TOML file with database settings and engine defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. `debug`, `deal_core=trace`). Defaults to `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Print the analysis of a stored listing, including its saved overrides.
    Analyze {
        #[arg(long)]
        listing: String,
    },
    /// Edit a stored listing interactively; commands are read from stdin.
    Session {
        #[arg(long)]
        listing: String,
    },
    /// Edit a hand-entered property interactively.
    Custom {
        /// Asking price.
        #[arg(long)]
        price: Decimal,

        /// Total number of units.
        #[arg(long)]
        units: u32,

        /// ZIP code used for market-rent lookup.
        #[arg(long)]
        zip: String,

        /// Annual tax bill. Estimated from the price when omitted.
        #[arg(long)]
        tax: Option<Decimal>,

        /// Monthly gross rent, used when the unit mix is unusable.
        #[arg(long)]
        gross: Option<Decimal>,

        /// Unit mix as `beds:count` pairs, e.g. `2:1;3:2`.
        #[arg(long)]
        mix: Option<String>,

        /// Pick up the edits saved by the previous custom session.
        #[arg(long)]
        resume: bool,
    },
    /// List stored listings.
    Listings,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref())?;
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    if let Some(db) = cli.db {
        config.database.connection_string = db;
    }

    let repo = app::open_repository(&config.database).await?;

    match cli.action {
        Action::Listings => {
            let properties = repo
                .list_properties()
                .await
                .context("Failed to list properties")?;
            print!("{}", render::render_listings(&properties));
        }
        Action::Analyze { listing } => {
            let property = app::load_listing(&*repo, &ListingId::from(listing)).await?;
            let analysis = app::analyze(&*repo, &property, &config.engine).await?;
            let profile = (&property.listing_id).into();
            print!("{}", render::render_analysis(&property, profile, &analysis));
        }
        Action::Session { listing } => {
            let property = app::load_listing(&*repo, &ListingId::from(listing)).await?;
            interactive(repo, property, config.engine, true).await?;
        }
        Action::Custom {
            price,
            units,
            zip,
            tax,
            gross,
            mix,
            resume,
        } => {
            let zip = normalize_zip(&zip).with_context(|| format!("Invalid ZIP code '{zip}'"))?;
            let tax = tax.unwrap_or(config.engine.expenses.tax_placeholder);

            let mut property = Property::custom(zip, price, tax, units);
            property.monthly_gross = gross;
            if let Some(mix) = mix {
                property.unit_mix = parse_unit_mix(&mix)
                    .map_err(|entry| anyhow::anyhow!("Invalid unit mix entry '{entry}'"))?;
            }

            interactive(repo, property, config.engine, resume).await?;
        }
    }

    Ok(())
}

async fn interactive(
    repo: Arc<dyn PropertyRepository>,
    property: Property,
    engine: EngineConfig,
    resume: bool,
) -> Result<()> {
    let (mut session, sink) = app::open_session(repo, property, engine, resume).await?;

    let result = app::run_session(&mut session, std::io::stdin().lock(), &mut std::io::stdout());
    sink.flush().await;
    result
}
