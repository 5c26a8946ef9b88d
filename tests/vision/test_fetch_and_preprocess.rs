// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Image download, decoding and CLIP preprocessing against a local server

use axum::{routing::get, Router};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pulseview::vision::preprocessing::{preprocess_for_clip, CLIP_MEAN, CLIP_STD};
use pulseview::vision::{ImageFetchError, ImageFetcher};
use std::io::Cursor;
use std::net::SocketAddr;

fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

async fn serve(routes: Vec<(&'static str, Vec<u8>)>) -> SocketAddr {
    let mut app = Router::new();
    for (path, body) in routes {
        app = app.route(path, get(move || std::future::ready(body.clone())));
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_fetch_jpeg_and_preprocess() {
    let jpeg = encode(
        RgbImage::from_pixel(300, 200, Rgb([120, 130, 140])),
        ImageFormat::Jpeg,
    );
    let addr = serve(vec![("/scene.jpg", jpeg)]).await;

    let image = ImageFetcher::new()
        .fetch(&format!("http://{}/scene.jpg", addr))
        .await
        .unwrap();
    assert_eq!((image.width(), image.height()), (300, 200));

    let tensor = preprocess_for_clip(&image);
    assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
}

#[tokio::test]
async fn test_fetched_png_is_normalized_with_clip_statistics() {
    let png = encode(RgbImage::from_pixel(64, 64, Rgb([255, 0, 128])), ImageFormat::Png);
    let addr = serve(vec![("/flat.png", png)]).await;

    let image = ImageFetcher::new()
        .fetch(&format!("http://{}/flat.png", addr))
        .await
        .unwrap();
    let tensor = preprocess_for_clip(&image);

    let red = (1.0 - CLIP_MEAN[0]) / CLIP_STD[0];
    let green = (0.0 - CLIP_MEAN[1]) / CLIP_STD[1];
    assert!((tensor[[0, 0, 112, 112]] - red).abs() < 1e-3);
    assert!((tensor[[0, 1, 0, 0]] - green).abs() < 1e-3);
}

#[tokio::test]
async fn test_non_image_body_is_decode_error() {
    let addr = serve(vec![("/page.html", b"<html></html>".to_vec())]).await;

    let err = ImageFetcher::new()
        .fetch(&format!("http://{}/page.html", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, ImageFetchError::Decode(_)));
    assert!(err.to_string().starts_with("Error processing image"));
}

#[tokio::test]
async fn test_not_found_is_download_error() {
    let addr = serve(vec![]).await;

    let err = ImageFetcher::new()
        .fetch(&format!("http://{}/gone.png", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, ImageFetchError::Download(_)));
}
