// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loads the CLIP encoder and caption decoder for change analysis

use std::path::PathBuf;
use std::sync::Arc;

use super::pipeline::ChangeAnalysisService;
use crate::caption::{CaptionDecoder, DEFAULT_MAX_NEW_TOKENS, DEFAULT_VISUAL_DIM};
use crate::vision::VisionEncoder;

/// Configuration for loading change-analysis models
#[derive(Debug, Clone)]
pub struct AnalysisModelConfig {
    /// CLIP vision model directory
    pub vision_model_dir: PathBuf,
    /// Caption language model directory
    pub caption_model_dir: PathBuf,
    /// Width of the vision encoder's hidden state
    pub visual_dim: usize,
    pub max_new_tokens: usize,
    /// Seed for the untrained visual projector
    pub projector_seed: u64,
}

impl Default for AnalysisModelConfig {
    fn default() -> Self {
        Self {
            vision_model_dir: PathBuf::from("./models/clip-vit-large-patch14-onnx"),
            caption_model_dir: PathBuf::from("./models/qwen2-1.5b-instruct-onnx"),
            visual_dim: DEFAULT_VISUAL_DIM,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            projector_seed: 0,
        }
    }
}

/// Information about a loaded model
#[derive(Debug, Clone)]
pub struct AnalysisModelInfo {
    pub name: String,
    /// vision or caption
    pub model_type: String,
    pub available: bool,
}

/// Holds whichever change-analysis models loaded successfully
///
/// A model that fails to load is logged and left out; change analysis is
/// only offered when both are present.
pub struct AnalysisModelManager {
    vision_encoder: Option<Arc<VisionEncoder>>,
    caption_decoder: Option<Arc<CaptionDecoder>>,
}

impl AnalysisModelManager {
    pub async fn new(config: AnalysisModelConfig) -> Self {
        let vision_encoder = match VisionEncoder::new(&config.vision_model_dir).await {
            Ok(model) => {
                tracing::info!(
                    "✅ CLIP vision encoder loaded from {}",
                    config.vision_model_dir.display()
                );
                Some(Arc::new(model))
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Failed to load vision encoder from {}: {:#}",
                    config.vision_model_dir.display(),
                    e
                );
                None
            }
        };

        let caption_decoder = match CaptionDecoder::new(
            &config.caption_model_dir,
            config.visual_dim,
            config.projector_seed,
        )
        .await
        {
            Ok(model) => {
                tracing::info!(
                    "✅ Caption decoder loaded from {}",
                    config.caption_model_dir.display()
                );
                Some(Arc::new(model.with_max_new_tokens(config.max_new_tokens)))
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Failed to load caption decoder from {}: {:#}",
                    config.caption_model_dir.display(),
                    e
                );
                None
            }
        };

        Self {
            vision_encoder,
            caption_decoder,
        }
    }

    /// The pipeline, if both models are available
    pub fn service(&self) -> Option<ChangeAnalysisService> {
        match (&self.vision_encoder, &self.caption_decoder) {
            (Some(encoder), Some(decoder)) => Some(ChangeAnalysisService::new(
                encoder.clone(),
                decoder.clone(),
            )),
            _ => None,
        }
    }

    pub fn list_models(&self) -> Vec<AnalysisModelInfo> {
        vec![
            AnalysisModelInfo {
                name: "clip-vit-large-patch14".to_string(),
                model_type: "vision".to_string(),
                available: self.vision_encoder.is_some(),
            },
            AnalysisModelInfo {
                name: "qwen2-1.5b-instruct".to_string(),
                model_type: "caption".to_string(),
                available: self.caption_decoder.is_some(),
            },
        ]
    }
}
