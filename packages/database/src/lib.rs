#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident store for the denúncia backend.
//!
//! The [`DenunciaStore`] trait is the seam between the query/aggregation
//! crates and storage. Two implementations are provided:
//!
//! * [`postgis::PostgisStore`] persists to `PostGIS` through
//!   `switchy_database`, using raw SQL via `query_raw_params()` for the
//!   spatial predicates and `switchy_schema` for embedded migrations.
//! * [`memory::MemoryStore`] keeps everything behind a lock, for tests and
//!   local development.
//!
//! Both pair every incident mutation with a history snapshot atomically.

pub mod db;
pub mod memory;
pub mod postgis;
pub mod queries;
pub mod store;

use include_dir::{Dir, include_dir};
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

pub use memory::MemoryStore;
pub use postgis::PostgisStore;
pub use store::{DenunciaStore, create_denuncia};

/// Embedded SQL migrations from the `migrations/` directory.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// Another incident already holds this protocol code.
    #[error("Protocol already in use: {protocolo}")]
    DuplicateProtocol {
        /// The conflicting code.
        protocolo: String,
    },

    /// A fresh protocol code could not be allocated.
    #[error("Could not allocate a unique protocol after {attempts} attempts")]
    ProtocolExhausted {
        /// Number of codes tried.
        attempts: u32,
    },

    /// The in-memory store lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Database migrations completed successfully");
    Ok(())
}
