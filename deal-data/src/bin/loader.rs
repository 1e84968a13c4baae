use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use deal_data::{PropertyLoader, RentTableLoader};
use deal_db_sqlite::SqliteRepository;

/// Load market rents and listings from CSV files into the database.
///
/// The rents CSV has the payment-standards export columns:
/// - zip_code: ZIP code (leading zeros may be missing)
/// - city: Neighbourhood name (optional)
/// - studio_rent, one_br_rent, ... six_br_rent: Monthly rent per bedroom count
///
/// The listings CSV has the columns:
/// - listing_id, address, city, state, zip
/// - list_price, tax, total_units
/// - monthly_gross, operating_expenses (optional)
/// - unit_mix: `bedrooms:count` pairs separated by `;`
#[derive(Parser, Debug)]
#[command(name = "deal-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a market-rent CSV file
    #[arg(short, long)]
    rents: Option<PathBuf>,

    /// Path to a listings CSV file
    #[arg(short, long)]
    properties: Option<PathBuf>,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "deals.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.rents.is_none() && args.properties.is_none() && !args.migrate && args.seeds.is_none()
    {
        anyhow::bail!("Nothing to do: pass --rents, --properties, --migrate or --seeds");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.rents {
        println!("Loading market rents from: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = RentTableLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        println!("Parsed {} records from CSV", records.len());

        let loaded = RentTableLoader::load(&repo, &records)
            .await
            .context("Failed to load market rents into database")?;

        println!("Successfully loaded market rents for {} ZIP codes.", loaded);
    }

    if let Some(path) = &args.properties {
        println!("Loading listings from: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = PropertyLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        println!("Parsed {} records from CSV", records.len());

        let loaded = PropertyLoader::load(&repo, &records)
            .await
            .context("Failed to load listings into database")?;

        println!("Successfully loaded {} listings.", loaded);
    }

    Ok(())
}
