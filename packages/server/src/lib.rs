#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for citizen incident reports.
//!
//! Serves the REST API under `/api/denuncias/` for creating, listing,
//! mapping, exporting and auditing reports. Storage is a `PostGIS`
//! database by default or a process-local store for demos and tests.

pub mod config;
pub mod error;
mod handlers;
pub mod permissions;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use chrono::FixedOffset;
use denuncia_database::{DenunciaStore, MemoryStore, PostgisStore, db, run_migrations};

use crate::config::{ServerConfig, StoreKind};
use crate::error::ApiError;
use crate::permissions::{PermissionPolicy, RolePolicy};

/// Shared application state.
pub struct AppState {
    /// Incident store.
    pub store: Arc<dyn DenunciaStore>,
    /// Mutation permission policy.
    pub policy: Arc<dyn PermissionPolicy>,
    /// Service time zone.
    pub tz: FixedOffset,
}

impl AppState {
    /// State with the default [`RolePolicy`].
    #[must_use]
    pub fn new(store: Arc<dyn DenunciaStore>, tz: FixedOffset) -> Self {
        Self {
            store,
            policy: Arc::new(RolePolicy),
            tz,
        }
    }
}

/// Registers the API routes. Literal segments are registered before
/// `{id}` so they are never captured as ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::MalformedBody(format!("JSON parse error - {err}")).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/denuncias")
                    .route("/", web::get().to(handlers::list))
                    .route("/create/", web::post().to(handlers::create))
                    .route("/heatmap/", web::get().to(handlers::heatmap))
                    .route("/relatorios/", web::get().to(handlers::report))
                    .route("/dashboard/", web::get().to(handlers::dashboard))
                    .route(
                        "/categoria/{categoria}/",
                        web::get().to(handlers::by_category),
                    )
                    .route(
                        "/protocolo/{protocolo}/",
                        web::get().to(handlers::by_protocol),
                    )
                    .route("/{id}/", web::get().to(handlers::detail))
                    .service(
                        web::resource("/{id}/update/")
                            .route(web::put().to(handlers::update))
                            .route(web::patch().to(handlers::update)),
                    )
                    .route("/{id}/delete/", web::delete().to(handlers::delete))
                    .route("/{id}/historico/", web::get().to(handlers::history)),
            ),
    );
}

async fn open_store(config: &ServerConfig) -> Arc<dyn DenunciaStore> {
    match config.store {
        StoreKind::Memory => {
            log::warn!("Using in-memory store; data will be lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Postgres => {
            log::info!("Connecting to database...");
            let db_conn = db::connect(&config.database_url)
                .await
                .expect("Failed to connect to database");

            log::info!("Running migrations...");
            run_migrations(db_conn.as_ref())
                .await
                .expect("Failed to run migrations");

            Arc::new(PostgisStore::new(Arc::from(db_conn)))
        }
    }
}

/// Starts the denúncia API server.
///
/// Opens the configured store (running migrations for `PostGIS`) and
/// starts the Actix-Web HTTP server. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the database connection fails or migrations fail.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let store = open_store(&config).await;
    let state = web::Data::new(AppState::new(store, config.tz));

    log::info!(
        "Starting server on {}:{} (UTC offset {})",
        config.bind_addr,
        config.port,
        config.tz
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
