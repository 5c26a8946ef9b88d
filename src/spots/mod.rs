// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Points of interest ("spots") with SRID-tagged point geometry

mod migrations;
pub mod model;
pub mod seed;
pub mod store;

pub use model::{GeoPoint, GeoSpot, NewSpot, WGS84_SRID};
pub use seed::{read_seed_rows, seed_from_csv, SeedOutcome};
pub use store::SpotStore;
