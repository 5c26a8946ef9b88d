// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spot response types

use serde::{Deserialize, Serialize};

use crate::spots::GeoSpot;

/// A stored spot as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotResponse {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoSpot> for SpotResponse {
    fn from(spot: GeoSpot) -> Self {
        Self {
            id: spot.id,
            name: spot.name,
            category: spot.category,
            latitude: spot.latitude,
            longitude: spot.longitude,
        }
    }
}
