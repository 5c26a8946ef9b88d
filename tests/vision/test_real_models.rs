// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end checks with ONNX models on disk
//!
//! Expects:
//! - ./models/clip-vit-large-patch14-onnx/vision_model.onnx
//! - ./models/qwen2-1.5b-instruct-onnx/{decoder_model,embed_tokens}.onnx + tokenizer.json

use image::{DynamicImage, Rgb, RgbImage};
use pulseview::analysis::{AnalysisModelConfig, AnalysisModelManager, ChangeAnalyzer};
use pulseview::caption::CaptionDecoder;
use pulseview::vision::{FeatureExtractor, VisionEncoder};

const VISION_MODEL_DIR: &str = "./models/clip-vit-large-patch14-onnx";

fn scene(fill: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, _| {
        if x < 128 {
            Rgb([40, 90, 40])
        } else {
            Rgb(fill)
        }
    }))
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_clip_encoder_mask_has_one_value_per_token() {
    let encoder = VisionEncoder::new(VISION_MODEL_DIR).await.unwrap();

    let pre = encoder.extract_features(&scene([40, 90, 40])).unwrap();
    let post = encoder.extract_features(&scene([200, 200, 210])).unwrap();
    assert_eq!(pre.shape(), post.shape());

    let analysis = ChangeAnalyzer::new()
        .get_key_change_features(&pre, &post)
        .unwrap();
    assert_eq!(analysis.change_mask.shape(), &pre.shape()[1..pre.shape().len() - 1]);
    assert!(analysis.changed_regions() > 0);
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_model_manager_builds_service() {
    let config = AnalysisModelConfig {
        max_new_tokens: 8,
        ..AnalysisModelConfig::default()
    };
    let manager = AnalysisModelManager::new(config).await;

    assert!(manager.list_models().iter().all(|m| m.available));
    assert!(manager.service().is_some());
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_caption_decoder_reports_model_width() {
    let decoder = CaptionDecoder::new(AnalysisModelConfig::default().caption_model_dir, 1024, 0)
        .await
        .unwrap()
        .with_max_new_tokens(8);

    assert_eq!(decoder.max_new_tokens(), 8);
    assert!(decoder.hidden_size() > 0);
}
