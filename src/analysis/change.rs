// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feature-space change detection between two images

use ndarray::{ArrayD, Axis};
use thiserror::Error;
use tracing::debug;

use crate::vision::FeatureTensor;

#[derive(Debug, Error, PartialEq)]
pub enum ChangeAnalysisError {
    #[error("feature shapes differ: pre {pre:?}, post {post:?}")]
    ShapeMismatch { pre: Vec<usize>, post: Vec<usize> },

    #[error("feature tensors have no feature axis")]
    EmptyFeatures,
}

/// Output of [`ChangeAnalyzer::get_key_change_features`]
#[derive(Debug, Clone)]
pub struct ChangeAnalysis {
    /// `|post - pre|`, same shape as the inputs
    pub key_change_features: ArrayD<f32>,
    /// One value per region, 1.0 where the region changed more than average
    pub change_mask: ArrayD<f32>,
}

impl ChangeAnalysis {
    /// Number of regions marked as changed
    pub fn changed_regions(&self) -> usize {
        self.change_mask.iter().filter(|&&v| v > 0.0).count()
    }
}

/// Stateless difference-and-threshold rule
///
/// The feature axis (last) is averaged into one scalar per region, a leading
/// batch axis of length 1 is dropped, and a region is changed when its scalar
/// is strictly greater than the mean over all regions of the same request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeAnalyzer;

impl ChangeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn get_key_change_features(
        &self,
        features_pre: &FeatureTensor,
        features_post: &FeatureTensor,
    ) -> Result<ChangeAnalysis, ChangeAnalysisError> {
        if features_pre.shape() != features_post.shape() {
            return Err(ChangeAnalysisError::ShapeMismatch {
                pre: features_pre.shape().to_vec(),
                post: features_post.shape().to_vec(),
            });
        }

        let pre = features_pre.view();
        let post = features_post.view();
        if pre.ndim() == 0 {
            return Err(ChangeAnalysisError::EmptyFeatures);
        }

        let key_change_features = (post - pre).mapv(f32::abs);

        let feature_axis = Axis(key_change_features.ndim() - 1);
        let mut change_map = key_change_features
            .mean_axis(feature_axis)
            .ok_or(ChangeAnalysisError::EmptyFeatures)?;

        if change_map.ndim() > 0 && change_map.len_of(Axis(0)) == 1 {
            change_map = change_map.index_axis_move(Axis(0), 0);
        }

        let threshold = change_map.mean().unwrap_or(0.0);
        let change_mask = change_map.mapv(|v| if v > threshold { 1.0 } else { 0.0 });

        debug!(
            "Change map {:?}, threshold {:.6}, {} of {} regions changed",
            change_map.shape(),
            threshold,
            change_mask.iter().filter(|&&v| v > 0.0).count(),
            change_mask.len()
        );

        Ok(ChangeAnalysis {
            key_change_features,
            change_mask,
        })
    }
}
