// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote image download for change analysis

use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

use super::image_utils::{decode_image_bytes, ImageError, MAX_IMAGE_SIZE};

/// The two failures change analysis reports back to the caller
#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("Could not download image: {0}")]
    Download(String),

    #[error("Error processing image: {0}")]
    Decode(#[from] ImageError),
}

/// Downloads and decodes images over plain HTTP(S)
///
/// Uses the `reqwest` client defaults: no explicit timeout, no retries.
#[derive(Debug, Clone, Default)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// GET `url` and decode the body into an RGB image
    ///
    /// Non-success status codes count as download failures. Bodies larger
    /// than [`MAX_IMAGE_SIZE`] are rejected without being buffered in full.
    pub async fn fetch(&self, url: &str) -> Result<DynamicImage, ImageFetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ImageFetchError::Download(e.to_string()))?;

        let bytes = read_limited_body(response, MAX_IMAGE_SIZE).await?;

        let (image, info) = decode_image_bytes(&bytes)?;
        debug!(
            "Fetched {} ({}x{}, {:?}, {} bytes)",
            url, info.width, info.height, info.format, info.size_bytes
        );

        Ok(image)
    }
}

/// Read a response body, giving up as soon as it exceeds `limit` bytes
async fn read_limited_body(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ImageFetchError> {
    // Check response size before reading
    if let Some(content_length) = response.content_length() {
        if content_length > limit as u64 {
            return Err(ImageError::TooLarge(content_length as usize, limit).into());
        }
    }

    let mut body = Vec::with_capacity(response.content_length().map_or(0, |len| len as usize));
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ImageFetchError::Download(e.to_string()))?
    {
        if body.len() + chunk.len() > limit {
            return Err(ImageError::TooLarge(body.len() + chunk.len(), limit).into());
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
