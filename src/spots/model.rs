// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spot records and their point geometry

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// WGS 84 spatial reference identifier
pub const WGS84_SRID: i32 = 4326;

/// A 2-D point tagged with its spatial reference
///
/// `x` is the longitude and `y` the latitude, matching the `POINT(x y)` axis
/// order used by spatial databases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
    pub srid: i32,
}

impl GeoPoint {
    /// Build a WGS 84 point from latitude/longitude
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        Self {
            x: longitude,
            y: latitude,
            srid: WGS84_SRID,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.y
    }

    pub fn longitude(&self) -> f64 {
        self.x
    }

    /// A point is storable when both coordinates are finite numbers
    pub fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            bail!("invalid point geometry: POINT({} {})", self.x, self.y);
        }
        Ok(())
    }

    /// Well-known text form, e.g. `POINT(28.97 41.01)`
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.x, self.y)
    }
}

/// A stored point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSpot {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoSpot {
    pub fn from_parts(id: i64, name: String, category: String, location: GeoPoint) -> Self {
        Self {
            id,
            name,
            category,
            latitude: location.latitude(),
            longitude: location.longitude(),
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::from_lat_lon(self.latitude, self.longitude)
    }
}

/// Payload for creating a spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpot {
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewSpot {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            latitude,
            longitude,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::from_lat_lon(self.latitude, self.longitude)
    }
}
