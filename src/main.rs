use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memewire::config::Config;
use memewire::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memewire=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("MEMEWIRE_CONFIG").unwrap_or_else(|_| "memewire.toml".to_string());
    let config = Config::load(&config_path)?.with_news_api_key(std::env::var("NEWS_API_KEY").ok());
    info!(
        "Loaded configuration from {} ({} subreddits)",
        config_path,
        config.reddit.subreddits.len()
    );
    if config.news.api_key.is_none() {
        warn!("NEWS_API_KEY is not set; news endpoints will return errors");
    }

    let state = Arc::new(AppState::from_config(&config)?);

    let app = routes::app(state).layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server starting on http://{}", config.server.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
