// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spot endpoints
//!
//! - GET  /api/v1/spots?skip=&limit=
//! - POST /api/v1/spots

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{create_spot_handler, list_spots_handler};
pub use request::{CreateSpotRequest, ListSpotsQuery};
pub use response::SpotResponse;
