// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod caption;
pub mod config;
pub mod spots;
pub mod version;
pub mod vision;

pub use analysis::{AnalysisModelConfig, AnalysisModelManager, ChangeAnalysisService, ChangeAnalyzer};
pub use api::{create_app, AppState};
pub use caption::{CaptionDecoder, CaptionGenerator};
pub use config::ServerArgs;
pub use spots::{GeoSpot, NewSpot, SpotStore};
pub use vision::{FeatureExtractor, FeatureTensor, ImageFetcher, VisionEncoder};
