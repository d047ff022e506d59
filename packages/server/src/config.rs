//! Server configuration from environment variables.

use chrono::{FixedOffset, Offset as _, Utc};
use denuncia_database::db::DEFAULT_DATABASE_URL;
use denuncia_filters::parse_utc_offset;

/// Service time zone used when `DENUNCIA_UTC_OFFSET` is unset or invalid.
pub const DEFAULT_UTC_OFFSET: &str = "-03:00";

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default port.
pub const DEFAULT_PORT: u16 = 8080;

/// Which [`DenunciaStore`](denuncia_database::DenunciaStore) backs the
/// server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// `PostGIS` through `switchy_database`.
    #[default]
    Postgres,
    /// Process-local store; data is lost on exit.
    Memory,
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `PostGIS` connection URL.
    pub database_url: String,
    /// Store backend.
    pub store: StoreKind,
    /// Service time zone for day boundaries, labels and protocol dates.
    pub tz: FixedOffset,
    /// Bind address.
    pub bind_addr: String,
    /// Port.
    pub port: u16,
}

fn default_tz() -> FixedOffset {
    parse_utc_offset(DEFAULT_UTC_OFFSET).unwrap_or_else(|| Utc.fix())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            store: StoreKind::default(),
            tz: default_tz(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Invalid values fall back
    /// to their defaults with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let store = match lookup("DENUNCIA_STORE").as_deref() {
            None | Some("" | "postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                log::warn!("Unknown DENUNCIA_STORE {other:?}, using postgres");
                StoreKind::Postgres
            }
        };

        let tz = match lookup("DENUNCIA_UTC_OFFSET") {
            None => defaults.tz,
            Some(raw) => parse_utc_offset(&raw).unwrap_or_else(|| {
                log::warn!("Invalid DENUNCIA_UTC_OFFSET {raw:?}, using {DEFAULT_UTC_OFFSET}");
                defaults.tz
            }),
        };

        let port = match lookup("PORT") {
            None => defaults.port,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Invalid PORT {raw:?}, using {DEFAULT_PORT}");
                defaults.port
            }),
        };

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            store,
            tz,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
        }
    }
}
