// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::change_analysis::change_analysis_handler;
use super::handlers::{not_found_handler, root_handler};
use super::spots::{create_spot_handler, list_spots_handler};
use crate::analysis::ChangeAnalysisService;
use crate::spots::SpotStore;

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub spot_store: SpotStore,
    /// `None` when the models failed to load at startup
    pub change_analysis: Option<Arc<ChangeAnalysisService>>,
}

impl AppState {
    pub fn new(spot_store: SpotStore, change_analysis: Option<ChangeAnalysisService>) -> Self {
        Self {
            spot_store,
            change_analysis: change_analysis.map(Arc::new),
        }
    }

    /// In-memory store, no models
    pub fn new_for_test() -> Result<Self> {
        Ok(Self::new(SpotStore::open_in_memory()?, None))
    }

    pub fn with_change_analysis(mut self, service: ChangeAnalysisService) -> Self {
        self.change_analysis = Some(Arc::new(service));
        self
    }
}

/// CORS restricted to `origins`, with credentials and mirrored methods/headers
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route(
            "/api/v1/spots",
            get(list_spots_handler).post(create_spot_handler),
        )
        .route("/api/v1/change_analysis", post(change_analysis_handler))
        .fallback(not_found_handler)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down API server");
        })
        .await
        .context("API server failed")?;

    Ok(())
}
