//! HTTP services backing a user-testing application.
//!
//! Two binaries share this library: the admin service manages users and
//! tests, the results service lists tests and records per-user scores. Each
//! owns its own schema and database file.

use actix_web::{
    middleware,
    web::{self, Data},
    App, HttpServer,
};
use log::info;
use sqlx::{migrate::Migrator, SqlitePool};

pub mod config;
pub mod db;
pub mod errors;
pub mod routes;
pub mod structs;

use config::Config;

static ADMIN_MIGRATOR: Migrator = sqlx::migrate!("./migrations/admin");
static RESULTS_MIGRATOR: Migrator = sqlx::migrate!("./migrations/results");

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Users and tests, tests owned by their creator.
    Admin,
    /// Tests and results, no user routes.
    Results,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Admin => "admin",
            Service::Results => "results",
        }
    }

    pub fn migrator(self) -> &'static Migrator {
        match self {
            Service::Admin => &ADMIN_MIGRATOR,
            Service::Results => &RESULTS_MIGRATOR,
        }
    }

    pub fn default_database_url(self) -> &'static str {
        match self {
            Service::Admin => "sqlite://user_testing_admin.db",
            Service::Results => "sqlite://user_testing_results.db",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Service::Admin => 5000,
            Service::Results => 5001,
        }
    }

    /// Registers this service's routes and JSON body handling.
    pub fn configure(self, cfg: &mut web::ServiceConfig) {
        match self {
            Service::Admin => routes::admin(cfg),
            Service::Results => routes::results(cfg),
        }
    }
}

/// Loads configuration, migrates the store, then serves until shutdown.
pub async fn run(service: Service) -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env(service).map_err(|e| {
        log::error!("FATAL: {}", e);
        e
    })?;

    let db_pool = db::connect(&config.database_url).await.map_err(|e| {
        log::error!("FATAL: cannot open {}: {}", config.database_url, e);
        e
    })?;

    db::migrate(&db_pool, service).await?;

    info!(
        "Starting {} service on http://{}:{}/",
        service.name(),
        config.host,
        config.port
    );

    let state = AppState {
        db_pool: db_pool.clone(),
    };

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            // always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .app_data(Data::new(state.clone()))
            .configure(|cfg| service.configure(cfg))
            .default_service(web::to(routes::default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    db_pool.close().await;
    info!("{} service stopped", service.name());
    Ok(())
}
