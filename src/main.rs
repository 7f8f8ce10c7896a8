use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use family_office_news::config::Config;
use family_office_news::cutoff::CutoffWindow;
use family_office_news::db::Database;
use family_office_news::fetcher::Fetcher;
use family_office_news::provider::GoogleNewsProvider;
use family_office_news::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "family_office_news=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("tracker.toml")?;
    info!("Tracking {} family offices by default", config.entities.len());

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url.clone());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let db = Arc::new(db);

    // Create fetcher
    let provider = Arc::new(GoogleNewsProvider::new(config.provider.clone())?);
    let window = CutoffWindow::days(config.cutoff_days);
    let fetcher = Arc::new(Fetcher::new(db.clone(), provider, window));

    // Create app state
    let state = Arc::new(AppState {
        db: db.clone(),
        fetcher,
        default_entities: config.entities.clone(),
        per_entity_cap: config.per_entity_cap,
        display_limit: config.display_limit,
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
