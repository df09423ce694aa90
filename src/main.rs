use playzo_api::{
    api::{create_router, AppState},
    config::Config,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "playzo_api=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    // Warm the catalog in the background so path locators served by this
    // process can be fetched over HTTP once the listener is up
    let cache = state.catalog.cache().clone();
    tokio::spawn(async move {
        let snapshot = cache.init().await;
        tracing::info!(
            games = snapshot.games.len(),
            health = ?snapshot.health,
            "Catalog warmed"
        );
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %config.bind_address(),
        source = %config.games_source_url,
        "Server running"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
