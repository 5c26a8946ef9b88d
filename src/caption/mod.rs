// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption generation for change features
//!
//! The change features from the vision side are projected into a causal
//! language model's embedding space and decoded into a short description.

pub mod chat_template;
pub mod decoder;
pub mod projector;

pub use chat_template::{apply_chat_template, caption_prompt, ChatMessage, Role};
pub use decoder::{
    CaptionDecoder, CaptionGenerator, DEFAULT_MAX_NEW_TOKENS, MAX_NEW_TOKENS, MIN_NEW_TOKENS,
};
pub use projector::{VisualProjector, DEFAULT_VISUAL_DIM};
