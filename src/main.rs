use ratify_server::config::StorageBackend;
use ratify_server::{AppState, config::Config, create_router};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Logging: RUST_LOG ha la precedenza sul filtro di default
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ratify_server=debug,tower_http=info")),
        )
        .with_target(true)
        .init();

    // 2. Configurazione da .env / variabili d'ambiente
    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    config.print_info();

    // 3. Store: MySQL con migrazioni, oppure tutto in memoria
    let state = match &config.storage {
        StorageBackend::MySql { database_url } => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
                .connect(database_url)
                .await?;
            info!("Connected to database");

            sqlx::migrate!().run(&pool).await?;
            info!("Migrations applied");

            AppState::new(pool, &config)
        }
        StorageBackend::Memory => AppState::in_memory(&config),
    };
    info!(
        "Email provider chain: {}",
        state.invitations.mailer().provider_names().join(" -> ")
    );

    // 4. Router con CORS e tracing delle richieste
    let app = create_router(Arc::new(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
