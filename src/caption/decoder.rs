// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Causal language model caption decoder
//!
//! Projects change features into the language model's embedding width,
//! places them in front of the embedded chat prompt and greedily decodes a
//! caption with ONNX Runtime.

use anyhow::{Context, Result};
use ndarray::{concatenate, Array2, ArrayD, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use super::chat_template::{caption_prompt, END_OF_TEXT, IM_END};
use super::projector::VisualProjector;

/// Default number of new tokens to generate
pub const DEFAULT_MAX_NEW_TOKENS: usize = 50;

/// Minimum tokens to generate
pub const MIN_NEW_TOKENS: usize = 1;

/// Maximum tokens to generate
pub const MAX_NEW_TOKENS: usize = 512;

const DECODER_FILE_NAMES: &[&str] = &["decoder_model.onnx", "decoder.onnx", "model.onnx"];
const EMBED_FILE_NAME: &str = "embed_tokens.onnx";
const TOKENIZER_FILE_NAME: &str = "tokenizer.json";

/// Anything that can caption a change-feature tensor given an instruction
pub trait CaptionGenerator: Send + Sync {
    fn generate_caption(&self, change_features: &ArrayD<f32>, instruction: &str)
        -> Result<String>;
}

fn load_session(path: &Path, what: &str) -> Result<Session> {
    Session::builder()
        .context(format!("Failed to create {what} session builder"))?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context(format!("Failed to set CPU execution provider for {what}"))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context(format!("Failed to set optimization level for {what}"))?
        .with_intra_threads(4)
        .context(format!("Failed to set intra threads for {what}"))?
        .commit_from_file(path)
        .context(format!("Failed to load {what} model from {}", path.display()))
}

/// Logits at the last sequence position of a `[1, seq, vocab]` or `[seq, vocab]` output
fn last_position_logits(output: &ArrayViewD<'_, f32>) -> Result<Vec<f32>> {
    let shape = output.shape();
    let logits = match shape.len() {
        3 if shape[1] > 0 => {
            let last = shape[1] - 1;
            (0..shape[2]).map(|v| output[IxDyn(&[0, last, v])]).collect()
        }
        2 if shape[0] > 0 => {
            let last = shape[0] - 1;
            (0..shape[1]).map(|v| output[IxDyn(&[last, v])]).collect()
        }
        _ => anyhow::bail!("Unexpected decoder logits shape: {:?}", shape),
    };
    Ok(logits)
}

/// Greedy choice; NaN logits never win
fn argmax(logits: &[f32]) -> Result<u32> {
    logits
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx as u32)
        .ok_or_else(|| anyhow::anyhow!("Empty logits vector"))
}

/// Clamp a requested generation length to `MIN_NEW_TOKENS..=MAX_NEW_TOKENS`
fn clamp_new_tokens(requested: usize) -> usize {
    requested.clamp(MIN_NEW_TOKENS, MAX_NEW_TOKENS)
}

/// Greedy decoding over an embedded prefix
///
/// `forward` maps the current `[seq, hidden]` sequence to next-token logits,
/// `embed` maps token ids to `[len, hidden]` embeddings. Returns only the
/// generated ids; a stop id ends generation and is not included.
fn greedy_decode<F, E>(
    prefix: Array2<f32>,
    max_new_tokens: usize,
    stop_token_ids: &[u32],
    mut forward: F,
    mut embed: E,
) -> Result<Vec<u32>>
where
    F: FnMut(&Array2<f32>) -> Result<Vec<f32>>,
    E: FnMut(&[u32]) -> Result<Array2<f32>>,
{
    let mut sequence = prefix;
    let mut generated: Vec<u32> = Vec::with_capacity(max_new_tokens);

    for step in 0..max_new_tokens {
        let logits = forward(&sequence)?;
        let next_token = argmax(&logits)?;

        if stop_token_ids.contains(&next_token) {
            debug!("Generation stopped at step {}", step);
            break;
        }

        generated.push(next_token);
        let next_embed = embed(&[next_token])?;
        sequence = concatenate(Axis(0), &[sequence.view(), next_embed.view()])
            .context("Failed to append generated token embedding")?;
    }

    Ok(generated)
}

/// Qwen2-style caption decoder
#[derive(Clone)]
pub struct CaptionDecoder {
    /// Decoder session: inputs_embeds (+ attention_mask, position_ids) -> logits
    session: Arc<Mutex<Session>>,
    /// Token id -> embedding session
    embed_session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    projector: Arc<VisualProjector>,
    hidden_size: usize,
    max_new_tokens: usize,
    stop_token_ids: Vec<u32>,
    uses_position_ids: bool,
    model_dir: PathBuf,
}

impl std::fmt::Debug for CaptionDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionDecoder")
            .field("model_dir", &self.model_dir)
            .field("hidden_size", &self.hidden_size)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("stop_token_ids", &self.stop_token_ids)
            .finish_non_exhaustive()
    }
}

impl CaptionDecoder {
    /// Load the decoder from a model directory
    ///
    /// Expected files:
    /// - `decoder_model.onnx` (or `decoder.onnx` / `model.onnx`)
    /// - `embed_tokens.onnx`
    /// - `tokenizer.json`
    ///
    /// `visual_dim` is the width of the change features fed to the projector;
    /// `projector_seed` makes the untrained projection reproducible.
    pub async fn new<P: AsRef<Path>>(
        model_dir: P,
        visual_dim: usize,
        projector_seed: u64,
    ) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        if !model_dir.exists() {
            anyhow::bail!("Caption model directory not found: {}", model_dir.display());
        }

        let decoder_path = DECODER_FILE_NAMES
            .iter()
            .map(|name| model_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Caption decoder model not found in {} (tried {:?})",
                    model_dir.display(),
                    DECODER_FILE_NAMES
                )
            })?;
        let embed_path = model_dir.join(EMBED_FILE_NAME);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE_NAME);

        if !embed_path.exists() {
            anyhow::bail!("Caption embed_tokens model not found: {}", embed_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Caption tokenizer not found: {}", tokenizer_path.display());
        }

        info!("Loading caption decoder from {}", model_dir.display());

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        info!("Loaded tokenizer with {} tokens", tokenizer.get_vocab_size(true));

        let stop_token_ids: Vec<u32> = [IM_END, END_OF_TEXT]
            .iter()
            .filter_map(|token| tokenizer.token_to_id(token))
            .collect();
        if stop_token_ids.is_empty() {
            warn!("⚠️ Tokenizer has no ChatML stop tokens; generation runs to max_new_tokens");
        }

        let embed_session = load_session(&embed_path, "embed_tokens")?;
        let session = load_session(&decoder_path, "caption decoder")?;

        let input_names: Vec<_> = session.inputs.iter().map(|i| i.name.clone()).collect();
        debug!("Caption decoder inputs: {:?}", input_names);
        if !input_names.iter().any(|name| name == "inputs_embeds") {
            anyhow::bail!(
                "Caption decoder {} does not accept inputs_embeds (inputs: {:?})",
                decoder_path.display(),
                input_names
            );
        }
        let uses_position_ids = input_names.iter().any(|name| name == "position_ids");

        let mut decoder = Self {
            session: Arc::new(Mutex::new(session)),
            embed_session: Arc::new(Mutex::new(embed_session)),
            tokenizer: Arc::new(tokenizer),
            projector: Arc::new(VisualProjector::initialize(visual_dim, 1, projector_seed)),
            hidden_size: 0,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            stop_token_ids,
            uses_position_ids,
            model_dir: model_dir.to_path_buf(),
        };

        // Embedding width comes from the model itself
        let sample = decoder.embed_tokens(&[decoder.stop_token_ids.first().copied().unwrap_or(0)])?;
        decoder.hidden_size = sample.ncols();
        decoder.projector = Arc::new(VisualProjector::initialize(
            visual_dim,
            decoder.hidden_size,
            projector_seed,
        ));

        info!(
            "✅ Caption decoder loaded successfully (CPU-only, {}D embeddings, projector {} -> {})",
            decoder.hidden_size, visual_dim, decoder.hidden_size
        );

        Ok(decoder)
    }

    /// Set the maximum number of generated tokens
    pub fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = clamp_new_tokens(max_new_tokens);
        self
    }

    pub fn max_new_tokens(&self) -> usize {
        self.max_new_tokens
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Generate a caption for `change_features` following `instruction`
    ///
    /// Only the newly generated ids are decoded, so the prompt never leaks
    /// into the caption.
    pub fn generate(&self, change_features: &ArrayD<f32>, instruction: &str) -> Result<String> {
        let visual_embeds = self
            .projector
            .project_tokens(change_features)
            .context("Failed to project change features")?;

        let prompt = caption_prompt(instruction);
        let encoding = self
            .tokenizer
            .encode(prompt.as_str(), false)
            .map_err(|e| anyhow::anyhow!("Failed to encode prompt: {}", e))?;
        let prompt_ids = encoding.get_ids();
        let prompt_embeds = self.embed_tokens(prompt_ids)?;

        debug!(
            "Caption input: {} visual tokens + {} prompt tokens",
            visual_embeds.nrows(),
            prompt_ids.len()
        );

        let prefix = concatenate(Axis(0), &[visual_embeds.view(), prompt_embeds.view()])
            .context("Visual and prompt embeddings have different widths")?;

        let generated = greedy_decode(
            prefix,
            self.max_new_tokens,
            &self.stop_token_ids,
            |sequence| self.forward(sequence),
            |ids| self.embed_tokens(ids),
        )?;

        let caption = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        debug!("Generated {} tokens: '{}'", generated.len(), caption.trim());

        Ok(caption.trim().to_string())
    }

    /// Convert token ids to `[len, hidden]` embeddings
    fn embed_tokens(&self, input_ids: &[u32]) -> Result<Array2<f32>> {
        let mut embed_session = self
            .embed_session
            .lock()
            .map_err(|_| anyhow::anyhow!("embed_tokens session lock poisoned"))?;

        let ids: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let input_ids_array = Array2::from_shape_vec((1, ids.len()), ids)?;
        let input_ids_value = Value::from_array(input_ids_array)
            .context("Failed to create input IDs tensor for embedding")?;

        let outputs = embed_session
            .run(ort::inputs!["input_ids" => input_ids_value])
            .context("embed_tokens inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract embeddings tensor")?;

        let shape = output_tensor.shape();
        if shape.len() != 3 || shape[1] != input_ids.len() {
            anyhow::bail!("Unexpected embed_tokens output shape: {:?}", shape);
        }

        let embeddings = Array2::from_shape_fn((shape[1], shape[2]), |(s, e)| {
            output_tensor[IxDyn(&[0, s, e])]
        });
        Ok(embeddings)
    }

    /// One full forward pass over `[seq, hidden]` embeddings; returns next-token logits
    fn forward(&self, sequence: &Array2<f32>) -> Result<Vec<f32>> {
        let seq_len = sequence.nrows();

        let inputs_embeds = Value::from_array(sequence.clone().insert_axis(Axis(0)))
            .context("Failed to create inputs_embeds tensor")?;
        let attention_mask = Value::from_array(Array2::<i64>::ones((1, seq_len)))
            .context("Failed to create attention mask tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Caption decoder session lock poisoned"))?;

        if self.uses_position_ids {
            let positions = Array2::from_shape_fn((1, seq_len), |(_, i)| i as i64);
            let position_ids =
                Value::from_array(positions).context("Failed to create position ids tensor")?;

            let outputs = session
                .run(ort::inputs![
                    "inputs_embeds" => inputs_embeds,
                    "attention_mask" => attention_mask,
                    "position_ids" => position_ids
                ])
                .context("Caption decoder inference failed")?;
            let logits = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract logits tensor")?;
            last_position_logits(&logits)
        } else {
            let outputs = session
                .run(ort::inputs![
                    "inputs_embeds" => inputs_embeds,
                    "attention_mask" => attention_mask
                ])
                .context("Caption decoder inference failed")?;
            let logits = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract logits tensor")?;
            last_position_logits(&logits)
        }
    }
}

impl CaptionGenerator for CaptionDecoder {
    fn generate_caption(&self, change_features: &ArrayD<f32>, instruction: &str) -> Result<String> {
        self.generate(change_features, instruction)
    }
}
