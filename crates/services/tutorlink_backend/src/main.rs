// File: services/tutorlink_backend/src/main.rs
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tutorlink_backend::{build_router, AppState, StartupError};
use tutorlink_config::{load_config, AppConfig};

async fn serve(config: Arc<AppConfig>) -> Result<(), StartupError> {
    let state = AppState::new(config.clone()).await?;
    let app = build_router(&state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = tutorlink_common::init_from_config(&config.logging);

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Tutorlink stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
