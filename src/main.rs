// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use pulseview::{
    analysis::AnalysisModelManager,
    api::{create_app, start_server, AppState},
    config::ServerArgs,
    spots::{seed_from_csv, SpotStore},
    version,
};
use std::env;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = ServerArgs::parse();

    info!("🚀 Starting {}", version::get_version_string());
    debug!("Build info: {}", version::get_version_info());
    debug!("Configuration: {:?}", args);

    // Spot store
    let spot_store = SpotStore::open(&args.database_path)
        .with_context(|| format!("Failed to open spot store at {}", args.database_path.display()))?;

    let seeded = seed_from_csv(&spot_store, &args.seed_csv)
        .await
        .with_context(|| format!("Failed to seed spots from {}", args.seed_csv.display()))?;
    debug!("Seed outcome: {:?}", seeded);

    // Change analysis models
    info!("🧠 Loading change analysis models...");
    let model_manager = AnalysisModelManager::new(args.model_config()).await;
    for model in model_manager.list_models() {
        info!(
            "   {} ({}): {}",
            model.name,
            model.model_type,
            if model.available { "available" } else { "unavailable" }
        );
    }
    let change_analysis = model_manager.service();
    if change_analysis.is_none() {
        warn!("⚠️ Change analysis disabled: /api/v1/change_analysis will answer 503");
    }

    let state = AppState::new(spot_store, change_analysis);
    let app = create_app(state, &args.cors_origins);

    start_server(args.listen_addr, app).await
}
