// File: services/tutorlink_backend/src/bin/seed_demo.rs
//! Fills the configured database with demo students, teachers and slots.
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tutorlink_backend::seed::{current_hour, populate_demo};
use tutorlink_backend::StartupError;
use tutorlink_config::load_config;
use tutorlink_db::Store;

async fn run() -> Result<(), StartupError> {
    let config = Arc::new(load_config()?);
    let store = Store::connect(&config).await?;

    let start_time = current_hour(chrono::Utc::now().timestamp());
    let report = populate_demo(&store, start_time).await?;
    if report.seeded {
        info!("Demo carts hold time slots {:?}", report.time_slot_ids);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tutorlink_common::init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Seeding failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
