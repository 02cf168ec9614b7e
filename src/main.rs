use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use payledger::config::{Config, StoreConfig};
use payledger::store::{LedgerStore, MongoStore, SqliteStore};
use payledger::{routes, LedgerEngine};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn open_store(config: &StoreConfig) -> io::Result<Arc<dyn LedgerStore>> {
    let store: Arc<dyn LedgerStore> = match config {
        StoreConfig::Sqlite { path } => {
            info!(path = %path.display(), "using sqlite store");
            Arc::new(SqliteStore::open(path).map_err(io::Error::other)?)
        }
        StoreConfig::Mongo { uri, database } => {
            info!(database = %database, "using mongodb store");
            Arc::new(
                MongoStore::connect(uri, database)
                    .await
                    .map_err(io::Error::other)?,
            )
        }
    };
    Ok(store)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let config = Config::from_env().map_err(io::Error::other)?;
    let store = open_store(&config.store).await?;
    let engine = web::Data::new(LedgerEngine::new(store));

    info!(address = %config.bind, "serving ledger");
    let server_engine = engine.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(server_engine.clone())
            .configure(routes::configure)
    })
    .bind(config.bind)?
    .run()
    .await?;

    engine.close().await.map_err(io::Error::other)?;
    info!("store closed");
    Ok(())
}
