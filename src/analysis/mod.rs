// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Change analysis between a pre and post image

pub mod change;
pub mod model_manager;
pub mod pipeline;

pub use crate::vision::FeatureTensor;
pub use change::{ChangeAnalysis, ChangeAnalysisError, ChangeAnalyzer};
pub use model_manager::{AnalysisModelConfig, AnalysisModelInfo, AnalysisModelManager};
pub use pipeline::{AnalysisError, ChangeAnalysisOutcome, ChangeAnalysisService};
