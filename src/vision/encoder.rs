// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CLIP vision encoder
//!
//! Runs the vision tower of CLIP (ViT-L/14 by default) through ONNX Runtime
//! and returns its last hidden state as the per-image feature tensor.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::features::{FeatureExtractor, FeatureTensor};
use super::preprocessing::{preprocess_for_clip, CLIP_INPUT_SIZE};

/// Preferred encoder output
pub const LAST_HIDDEN_STATE: &str = "last_hidden_state";

/// File names tried, in order, inside the model directory
const MODEL_FILE_NAMES: &[&str] = &["vision_model.onnx", "model.onnx"];

/// CLIP vision encoder model
#[derive(Clone)]
pub struct VisionEncoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String,
    output_index: usize,
    model_path: PathBuf,
}

impl std::fmt::Debug for VisionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionEncoder")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

impl VisionEncoder {
    /// Load the encoder from a model directory
    ///
    /// # Errors
    /// Returns error if:
    /// - Model directory or ONNX file not found
    /// - ONNX Runtime initialization fails
    pub async fn new<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        if !model_dir.exists() {
            anyhow::bail!(
                "Vision encoder directory not found: {}",
                model_dir.display()
            );
        }

        let model_path = MODEL_FILE_NAMES
            .iter()
            .map(|name| model_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Vision encoder model not found in {} (tried {:?})",
                    model_dir.display(),
                    MODEL_FILE_NAMES
                )
            })?;

        info!("Loading vision encoder from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(&model_path)
            .context(format!(
                "Failed to load vision encoder model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        let output_index = session
            .outputs
            .iter()
            .position(|output| output.name == LAST_HIDDEN_STATE)
            .unwrap_or(0);

        let output_name = session
            .outputs
            .get(output_index)
            .map(|output| output.name.clone())
            .unwrap_or_else(|| LAST_HIDDEN_STATE.to_string());

        debug!(
            "Vision encoder loaded - input: {}, output: {} (#{})",
            input_name, output_name, output_index
        );

        info!("✅ Vision encoder loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            output_index,
            model_path,
        })
    }

    /// Run the encoder on a preprocessed `[1, 3, H, W]` tensor
    pub fn encode(&self, input: &Array4<f32>) -> Result<FeatureTensor> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        if shape[2] != CLIP_INPUT_SIZE as usize || shape[3] != CLIP_INPUT_SIZE as usize {
            debug!(
                "Input size {}x{} differs from expected {}x{}",
                shape[2], shape[3], CLIP_INPUT_SIZE, CLIP_INPUT_SIZE
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Vision encoder session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Vision encoder inference failed")?;

        let hidden = outputs[self.output_index]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output tensor")?;

        debug!("Vision encoder output shape: {:?}", hidden.shape());

        Ok(FeatureTensor::new(hidden.to_owned()))
    }
}

impl FeatureExtractor for VisionEncoder {
    fn extract_features(&self, image: &DynamicImage) -> Result<FeatureTensor> {
        let input = preprocess_for_clip(image);
        self.encode(&input)
    }
}
