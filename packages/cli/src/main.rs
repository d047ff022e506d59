#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the denúncia backend: serve the API, run
//! migrations, or seed demo data.

mod seed;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use denuncia_database::{PostgisStore, db, run_migrations};
use denuncia_server::config::ServerConfig;
use rand::SeedableRng as _;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(name = "denuncia_cli", about = "Citizen incident report backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Run database migrations
    Migrate,
    /// Create fictitious incidents until the store holds `total`
    Seed {
        /// Desired number of incidents
        #[arg(long, default_value = "200")]
        total: u64,
        /// Fixed RNG seed for reproducible data
        #[arg(long)]
        rng_seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = ServerConfig::from_env();

    match cli.command {
        Commands::Serve => {
            actix_web::rt::System::new().block_on(denuncia_server::run_server(config))?;
        }
        Commands::Migrate => {
            tokio::runtime::Runtime::new()?.block_on(async {
                log::info!("Running database migrations...");
                let db = db::connect(&config.database_url).await?;
                run_migrations(db.as_ref()).await?;
                log::info!("Migrations complete.");
                Ok::<_, Box<dyn std::error::Error>>(())
            })?;
        }
        Commands::Seed { total, rng_seed } => {
            tokio::runtime::Runtime::new()?.block_on(async {
                let db = db::connect(&config.database_url).await?;
                run_migrations(db.as_ref()).await?;
                let store = PostgisStore::new(Arc::from(db));

                let mut rng = rng_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
                let created = seed::seed(&store, total, &mut rng, config.tz).await?;
                println!("{created} denúncias criadas.");
                Ok::<_, Box<dyn std::error::Error>>(())
            })?;
        }
    }

    Ok(())
}
