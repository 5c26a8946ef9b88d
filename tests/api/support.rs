// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers for API tests: stub models and a local image server

use axum::{body::Body, http::Request, response::Response, routing::get, Router};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::ArrayD;
use pulseview::analysis::ChangeAnalysisService;
use pulseview::api::{create_app, AppState};
use pulseview::caption::CaptionGenerator;
use pulseview::vision::{FeatureExtractor, FeatureTensor};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Four regions per image (quadrants), features = mean RGB of each quadrant
pub struct QuadrantExtractor;

impl FeatureExtractor for QuadrantExtractor {
    fn extract_features(&self, image: &DynamicImage) -> anyhow::Result<FeatureTensor> {
        let rgb = image.to_rgb8();
        let (w, h) = (rgb.width(), rgb.height());
        let mut sums = vec![0.0f32; 12];
        let mut counts = [0.0f32; 4];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let quadrant = usize::from(x >= w / 2) + 2 * usize::from(y >= h / 2);
            counts[quadrant] += 1.0;
            for c in 0..3 {
                sums[quadrant * 3 + c] += pixel[c] as f32 / 255.0;
            }
        }
        for (i, value) in sums.iter_mut().enumerate() {
            *value /= counts[i / 3].max(1.0);
        }
        FeatureTensor::from_shape_vec(&[1, 4, 3], sums)
    }
}

/// Echoes the instruction and the feature shape
pub struct EchoCaption;

impl CaptionGenerator for EchoCaption {
    fn generate_caption(
        &self,
        change_features: &ArrayD<f32>,
        instruction: &str,
    ) -> anyhow::Result<String> {
        Ok(format!("{} {:?}", instruction, change_features.shape()))
    }
}

pub struct FailingCaption;

impl CaptionGenerator for FailingCaption {
    fn generate_caption(&self, _: &ArrayD<f32>, _: &str) -> anyhow::Result<String> {
        anyhow::bail!("decoder session failed")
    }
}

fn png_bytes(image: RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// 16x16 black image
pub fn pre_image() -> Vec<u8> {
    png_bytes(RgbImage::from_pixel(16, 16, Rgb([0, 0, 0])))
}

/// Same as `pre_image` with the top-right quadrant painted white
pub fn post_image() -> Vec<u8> {
    png_bytes(RgbImage::from_fn(16, 16, |x, y| {
        if x >= 8 && y < 8 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

/// Serve `/pre.png`, `/post.png` and a corrupt `/broken.png` on a random port
pub async fn spawn_image_server() -> SocketAddr {
    let pre = pre_image();
    let post = post_image();
    let app = Router::new()
        .route("/pre.png", get(move || std::future::ready(pre.clone())))
        .route("/post.png", get(move || std::future::ready(post.clone())))
        .route("/broken.png", get(|| async { b"definitely not a png".to_vec() }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn state_with_stub_models() -> AppState {
    AppState::new_for_test()
        .unwrap()
        .with_change_analysis(ChangeAnalysisService::new(
            Arc::new(QuadrantExtractor),
            Arc::new(EchoCaption),
        ))
}

pub fn app(state: AppState) -> Router {
    create_app(state, &[TEST_ORIGIN.to_string()])
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
