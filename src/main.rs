use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Builder;
use log::{info, warn, LevelFilter};

use chirpy::assets::AssetDir;
use chirpy::config::Config;
use chirpy::db::{self, ScyllaStore};
use chirpy::store::{ChirpStore, MemoryStore};
use chirpy::{handlers, AppState};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    info!("Starting chirpy backend...");
    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let store: Arc<dyn ChirpStore> = match &config.db_nodes {
        Some(nodes) => {
            let session = db::create_session(nodes)
                .await
                .map_err(|e| startup_error("failed to create database session", e))?;
            db::ensure_schema(&session)
                .await
                .map_err(|e| startup_error("failed to apply schema", e))?;
            info!("Connected to ScyllaDB");
            Arc::new(ScyllaStore::new(Arc::new(session)))
        }
        None => {
            warn!("DB_URL is not set; chirps and users live in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let assets = AssetDir::open(&config.assets_dir).map_err(|e| {
        startup_error(
            &format!("failed to open assets dir {}", config.assets_dir.display()),
            e,
        )
    })?;

    let state = web::Data::new(AppState::new(
        store,
        assets,
        config.metrics_template.clone(),
        config.platform.clone(),
    ));

    info!("Listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .workers(config.workers)
    .bind(config.bind_addr)?
    .run()
    .await
}
