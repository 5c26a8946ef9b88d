// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spot endpoint handlers

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{debug, info, warn};

use super::request::{CreateSpotRequest, ListSpotsQuery};
use super::response::SpotResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// GET /api/v1/spots - List spots in insertion order
///
/// # Errors
/// - 400 Bad Request: skip/limit are not non-negative integers
/// - 500 Internal Server Error: store failure
pub async fn list_spots_handler(
    State(state): State<AppState>,
    Query(query): Query<ListSpotsQuery>,
) -> Result<Json<Vec<SpotResponse>>, ApiError> {
    debug!("List spots: skip={}, limit={}", query.skip, query.limit);

    let spots = state
        .spot_store
        .list_spots(query.skip, query.limit)
        .await
        .map_err(|e| {
            warn!("Failed to list spots: {:#}", e);
            ApiError::from(e)
        })?;

    Ok(Json(spots.into_iter().map(SpotResponse::from).collect()))
}

/// POST /api/v1/spots - Store a new spot
///
/// # Errors
/// - 500 Internal Server Error: store failure or invalid point geometry
pub async fn create_spot_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSpotRequest>,
) -> Result<Json<SpotResponse>, ApiError> {
    let spot = state
        .spot_store
        .create_spot(request.into())
        .await
        .map_err(|e| {
            warn!("Failed to create spot: {:#}", e);
            ApiError::from(e)
        })?;

    info!(
        "Created spot {} ({}) at {}",
        spot.id,
        spot.name,
        spot.location().to_wkt()
    );

    Ok(Json(SpotResponse::from(spot)))
}
