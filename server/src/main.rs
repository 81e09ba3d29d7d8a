// server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use foodlane::MemoryStore;
use foodlane_app::store::PgStore;
use foodlane_app::{AppConfig, AppError, AppState};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn startup_failure(stage: &str, err: AppError) -> std::io::Error {
  tracing::error!(error = %err, stage, "Server startup failed.");
  std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", stage, err))
}

async fn build_state(config: Arc<AppConfig>) -> Result<AppState, AppError> {
  match config.database_url.clone() {
    Some(url) => {
      let pool = PgPool::connect(&url).await?;
      tracing::info!("Successfully connected to the database.");
      if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied.");
      }
      AppState::new(config, Arc::new(PgStore::new(pool)))
    }
    None => {
      tracing::warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on exit.");
      AppState::new(config, Arc::new(MemoryStore::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting food marketplace server...");

  let app_config = Arc::new(AppConfig::from_env().map_err(|e| startup_failure("configuration", e))?);
  tracing::debug!(config = ?app_config, "Effective configuration.");

  let app_state = build_state(app_config.clone())
    .await
    .map_err(|e| startup_failure("storage", e))?;

  let server_address = app_config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(foodlane_app::web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
