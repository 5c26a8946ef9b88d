// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end change analysis: fetch, encode, compare, caption

use image::DynamicImage;
use ndarray::ArrayD;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::change::{ChangeAnalysisError, ChangeAnalyzer};
use crate::caption::CaptionGenerator;
use crate::vision::{FeatureExtractor, ImageFetchError, ImageFetcher};

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Download or decode failure for one of the two images
    #[error(transparent)]
    Fetch(#[from] ImageFetchError),

    #[error("Change analysis failed: {0}")]
    Analysis(#[from] ChangeAnalysisError),

    #[error("Inference failed: {0}")]
    Inference(anyhow::Error),
}

impl AnalysisError {
    /// True for failures caused by the caller's image URLs rather than the server
    pub fn is_image_failure(&self) -> bool {
        matches!(self, AnalysisError::Fetch(_))
    }
}

#[derive(Debug, Clone)]
pub struct ChangeAnalysisOutcome {
    pub caption: String,
    pub change_mask: ArrayD<f32>,
}

/// Owns the models for one change-analysis deployment
pub struct ChangeAnalysisService {
    fetcher: ImageFetcher,
    encoder: Arc<dyn FeatureExtractor>,
    analyzer: ChangeAnalyzer,
    decoder: Arc<dyn CaptionGenerator>,
}

impl std::fmt::Debug for ChangeAnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeAnalysisService")
            .field("fetcher", &self.fetcher)
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}

impl ChangeAnalysisService {
    pub fn new(encoder: Arc<dyn FeatureExtractor>, decoder: Arc<dyn CaptionGenerator>) -> Self {
        Self::with_fetcher(ImageFetcher::new(), encoder, decoder)
    }

    pub fn with_fetcher(
        fetcher: ImageFetcher,
        encoder: Arc<dyn FeatureExtractor>,
        decoder: Arc<dyn CaptionGenerator>,
    ) -> Self {
        Self {
            fetcher,
            encoder,
            analyzer: ChangeAnalyzer::new(),
            decoder,
        }
    }

    /// Run the full pipeline for one pre/post image pair
    ///
    /// The pre image is fetched before the post image; the first fetch error
    /// ends the request. Model inference runs on the blocking pool.
    pub async fn analyze(
        &self,
        image_url_pre: &str,
        image_url_post: &str,
        instruction: &str,
    ) -> Result<ChangeAnalysisOutcome, AnalysisError> {
        let image_pre = self.fetcher.fetch(image_url_pre).await?;
        let image_post = self.fetcher.fetch(image_url_post).await?;
        debug!(
            "Fetched images: pre {}x{}, post {}x{}",
            image_pre.width(),
            image_pre.height(),
            image_post.width(),
            image_post.height()
        );

        let encoder = Arc::clone(&self.encoder);
        let decoder = Arc::clone(&self.decoder);
        let analyzer = self.analyzer;
        let instruction = instruction.to_string();

        let outcome = tokio::task::spawn_blocking(move || {
            run_inference(
                encoder.as_ref(),
                &analyzer,
                decoder.as_ref(),
                &image_pre,
                &image_post,
                &instruction,
            )
        })
        .await
        .map_err(|e| AnalysisError::Inference(anyhow::anyhow!("Inference task failed: {}", e)))??;

        info!(
            "Change analysis complete: {} changed regions, caption {} chars",
            outcome.change_mask.iter().filter(|&&v| v > 0.0).count(),
            outcome.caption.len()
        );

        Ok(outcome)
    }
}

fn run_inference(
    encoder: &dyn FeatureExtractor,
    analyzer: &ChangeAnalyzer,
    decoder: &dyn CaptionGenerator,
    image_pre: &DynamicImage,
    image_post: &DynamicImage,
    instruction: &str,
) -> Result<ChangeAnalysisOutcome, AnalysisError> {
    let features_pre = encoder
        .extract_features(image_pre)
        .map_err(AnalysisError::Inference)?;
    let features_post = encoder
        .extract_features(image_post)
        .map_err(AnalysisError::Inference)?;

    let analysis = analyzer.get_key_change_features(&features_pre, &features_post)?;

    let caption = decoder
        .generate_caption(&analysis.key_change_features, instruction)
        .map_err(AnalysisError::Inference)?;

    Ok(ChangeAnalysisOutcome {
        caption,
        change_mask: analysis.change_mask,
    })
}
