// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Change analysis endpoint
//!
//! Provides POST /api/v1/change_analysis for captioning what changed between
//! two images of the same place.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::change_analysis_handler;
pub use request::ChangeAnalysisRequest;
pub use response::{mask_to_json, ChangeAnalysisResponse};
