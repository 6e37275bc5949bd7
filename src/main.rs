use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizmind::{config, db, gemini::GeminiClient, handlers, paths, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quizmind=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_path = config::load_database_path();
  let pool = db::init_db(&db_path).expect("Failed to initialize database");

  let api_key = config::gemini_api_key().unwrap_or_else(|| {
    tracing::warn!("GEMINI_API_KEY not set; quiz generation and chat will fail upstream");
    String::new()
  });
  let gemini = Arc::new(GeminiClient::new(api_key));

  let temp_dir = PathBuf::from(paths::temp_dir());
  std::fs::create_dir_all(&temp_dir).expect("Failed to create staging directory");

  let state = AppState::new(pool, gemini, temp_dir, PathBuf::from(paths::PUBLIC_DIR));
  let app = handlers::router(state);

  let bind_addr = config::server_bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config::SERVER_PORT);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
