use axum::serve;
use plantarium::api::routes::create_router;
use plantarium::config::AppConfig;
use plantarium::seed;
use plantarium::store::{MemoryStore, PostgresStore, Store};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .init();

    log::info!("Plantarium: Plant Variety API Server");

    // Load configuration
    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    match config.database_url() {
        Some(database_url) => {
            log::info!("Connecting to PostgreSQL...");
            let postgres_store = PostgresStore::new(&database_url).await?;

            log::info!("Running database migrations...");
            postgres_store.migrate().await?;
            log::info!("Database ready");

            let store = Arc::new(postgres_store);

            // Seed data for demonstration (optional)
            if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
                log::info!("Loading seed data...");
                seed::load_seed_data(&*store).await?;
            }

            run_server(store, &config).await
        }
        None => {
            log::info!("No database configured, running on the in-memory store");
            let store = Arc::new(MemoryStore::new());
            seed::load_seed_data(&*store).await?;
            run_server(store, &config).await
        }
    }
}

async fn run_server<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    let app = create_router().with_state(store);
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Plantarium server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
