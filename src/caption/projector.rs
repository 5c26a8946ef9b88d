// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Linear projection of visual features into the language model embedding space

use anyhow::{bail, Result};
use ndarray::{Array1, Array2, ArrayD};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// CLIP ViT-L/14 hidden width
pub const DEFAULT_VISUAL_DIM: usize = 1024;

/// `y = x · Wᵀ + b`
#[derive(Debug, Clone)]
pub struct VisualProjector {
    /// `[out_dim, in_dim]`
    weight: Array2<f32>,
    /// `[out_dim]`
    bias: Array1<f32>,
}

impl VisualProjector {
    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if weight.nrows() != bias.len() {
            bail!(
                "projector bias length {} does not match weight rows {}",
                bias.len(),
                weight.nrows()
            );
        }
        Ok(Self { weight, bias })
    }

    /// Untrained projection, uniform in `±1/√in_dim` for weight and bias
    pub fn initialize(in_dim: usize, out_dim: usize, seed: u64) -> Self {
        let bound = 1.0 / (in_dim.max(1) as f32).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        let mut rng = StdRng::seed_from_u64(seed);

        let weight = Array2::from_shape_fn((out_dim, in_dim), |_| dist.sample(&mut rng));
        let bias = Array1::from_shape_fn(out_dim, |_| dist.sample(&mut rng));

        Self { weight, bias }
    }

    pub fn in_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Project `[tokens, in_dim]` rows into `[tokens, out_dim]`
    pub fn project(&self, features: &Array2<f32>) -> Result<Array2<f32>> {
        if features.ncols() != self.in_dim() {
            bail!(
                "visual features are {} wide, projector expects {}",
                features.ncols(),
                self.in_dim()
            );
        }
        Ok(features.dot(&self.weight.t()) + &self.bias)
    }

    /// Flatten every axis but the last into tokens, then project
    pub fn project_tokens(&self, features: &ArrayD<f32>) -> Result<Array2<f32>> {
        let width = match features.shape().last() {
            Some(&width) if features.ndim() >= 1 => width,
            _ => bail!("visual features have no feature axis"),
        };
        if width != self.in_dim() {
            bail!(
                "visual features are {} wide, projector expects {}",
                width,
                self.in_dim()
            );
        }
        let tokens = if width == 0 { 0 } else { features.len() / width };
        let flat = Array2::from_shape_vec((tokens, width), features.iter().copied().collect())?;
        self.project(&flat)
    }
}
