use tokio::net::TcpListener;
use tracing::info;
use tripboard::config::AppConfig;
use tripboard::db::{init_pool, run_migrations};
use tripboard::error::AppError;
use tripboard::routes::create_router;
use tripboard::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let state = AppState::new(config.clone(), db);
    state.files.ensure_structure().await?;

    let _reminders = state
        .trips
        .notifier()
        .clone()
        .spawn_reminder_loop(config.reminder_poll_interval);

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tripboard=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
