// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spot request types

use serde::{Deserialize, Serialize};

use crate::spots::NewSpot;

pub const DEFAULT_LIMIT: u32 = 100;

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Pagination for GET /api/v1/spots
///
/// Negative or non-numeric values are rejected by the query extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListSpotsQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for ListSpotsQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Body of POST /api/v1/spots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSpotRequest {
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CreateSpotRequest> for NewSpot {
    fn from(request: CreateSpotRequest) -> Self {
        NewSpot::new(
            request.name,
            request.category,
            request.latitude,
            request.longitude,
        )
    }
}
