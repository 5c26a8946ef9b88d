// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod change_analysis;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod spots;

pub use change_analysis::{change_analysis_handler, ChangeAnalysisRequest, ChangeAnalysisResponse};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{root_handler, WelcomeResponse};
pub use http_server::{cors_layer, create_app, start_server, AppState};
pub use spots::{create_spot_handler, list_spots_handler, CreateSpotRequest, ListSpotsQuery, SpotResponse};
