// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use image::DynamicImage;
use ndarray::{ArrayD, IxDyn};

/// Encoder output for one image, typically `[1, tokens, hidden]`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor(ArrayD<f32>);

impl FeatureTensor {
    pub fn new(values: ArrayD<f32>) -> Self {
        Self(values)
    }

    /// Build from a shape and row-major values
    pub fn from_shape_vec(shape: &[usize], values: Vec<f32>) -> anyhow::Result<Self> {
        let array = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| anyhow::anyhow!("invalid feature tensor shape {:?}: {}", shape, e))?;
        Ok(Self(array))
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> &ArrayD<f32> {
        &self.0
    }
}

impl From<ArrayD<f32>> for FeatureTensor {
    fn from(values: ArrayD<f32>) -> Self {
        Self(values)
    }
}

/// Anything that turns a decoded image into a feature tensor
///
/// Implementations run blocking inference and must be shareable across
/// request handlers.
pub trait FeatureExtractor: Send + Sync {
    fn extract_features(&self, image: &DynamicImage) -> anyhow::Result<FeatureTensor>;
}
