// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision side of change analysis
//!
//! This module provides:
//! - Remote image download and decoding
//! - CLIP preprocessing
//! - The CLIP vision encoder (ONNX Runtime, CPU)

pub mod encoder;
pub mod features;
pub mod fetch;
pub mod image_utils;
pub mod preprocessing;

pub use encoder::VisionEncoder;
pub use features::{FeatureExtractor, FeatureTensor};
pub use fetch::{ImageFetchError, ImageFetcher};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
