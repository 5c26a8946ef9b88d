// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Change analysis endpoint handler

use axum::{extract::State, Json};
use tracing::{debug, info, warn};

use super::request::ChangeAnalysisRequest;
use super::response::ChangeAnalysisResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /api/v1/change_analysis - Caption the change between two images
///
/// # Request
/// - `image_url_pre`: URL of the earlier image
/// - `image_url_post`: URL of the later image
/// - `instruction`: user instruction for the caption
///
/// # Response
/// - `caption` and `change_mask` (nested lists of 0.0/1.0) on success
/// - `error` (HTTP 200) when either image cannot be downloaded or decoded
///
/// # Errors
/// - 503 Service Unavailable: models not loaded
/// - 500 Internal Server Error: inference failed
pub async fn change_analysis_handler(
    State(state): State<AppState>,
    Json(request): Json<ChangeAnalysisRequest>,
) -> Result<Json<ChangeAnalysisResponse>, ApiError> {
    debug!(
        "Change analysis request: pre={}, post={}",
        request.image_url_pre, request.image_url_post
    );

    let service = state.change_analysis.as_ref().ok_or_else(|| {
        warn!("Change analysis models not loaded");
        ApiError::ServiceUnavailable("Change analysis models not loaded".to_string())
    })?;

    match service
        .analyze(
            &request.image_url_pre,
            &request.image_url_post,
            &request.instruction,
        )
        .await
    {
        Ok(outcome) => {
            info!("Change analysis caption: '{}'", outcome.caption);
            Ok(Json(ChangeAnalysisResponse::success(
                outcome.caption,
                &outcome.change_mask,
            )))
        }
        Err(e) if e.is_image_failure() => {
            warn!("Change analysis image failure: {}", e);
            Ok(Json(ChangeAnalysisResponse::failure(e.to_string())))
        }
        Err(e) => {
            warn!("Change analysis failed: {}", e);
            Err(ApiError::InternalError(e.to_string()))
        }
    }
}
