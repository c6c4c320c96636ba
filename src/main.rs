use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use prayer_reminder::{
    api::routes::create_router,
    config::Config,
    presenter::NoticeLevel,
    scheduler::supervise,
    store::StateStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("prayer_reminder=info")),
        )
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;

    let store = match &config.state_path {
        Some(path) => StateStore::open(path),
        None => {
            warn!("no data directory available, state will not survive restarts");
            StateStore::in_memory()
        }
    };

    let (app_state, settings_rx) = AppState::new(config, store);

    if let Err(e) = app_state.locations.load().await {
        warn!(error = %e, "failed to load city data");
        app_state
            .presenter
            .notify(NoticeLevel::Warning, "Failed to load city data.");
    }

    let scheduler = app_state.scheduler();
    let supervisor = tokio::spawn(supervise(scheduler, settings_rx));

    let app = create_router(app_state);
    let listener = TcpListener::bind(server_addr).await?;

    info!(%server_addr, "listening");
    axum::serve(listener, app).await?;

    supervisor.abort();
    Ok(())
}
