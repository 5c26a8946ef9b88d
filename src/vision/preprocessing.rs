// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the CLIP vision encoder

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Target size for CLIP ViT-L/14
pub const CLIP_INPUT_SIZE: u32 = 224;

/// CLIP normalization mean values
pub const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];

/// CLIP normalization std values
pub const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// Preprocess an image for the CLIP encoder
///
/// Steps:
/// 1. Resize so the shortest edge is `CLIP_INPUT_SIZE` (bicubic)
/// 2. Center crop to `CLIP_INPUT_SIZE` x `CLIP_INPUT_SIZE`
/// 3. Normalize: (pixel/255 - mean) / std
/// 4. NCHW tensor [1, 3, H, W]
pub fn preprocess_for_clip(image: &DynamicImage) -> Array4<f32> {
    preprocess_with_size(image, CLIP_INPUT_SIZE)
}

pub fn preprocess_with_size(image: &DynamicImage, size: u32) -> Array4<f32> {
    let cropped = resize_shortest_edge_and_crop(image, size);
    let rgb = cropped.to_rgb8();

    let side = size as usize;
    let mut tensor = Array4::zeros((1, 3, side, side));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            let normalized = (pixel[c] as f32 / 255.0 - CLIP_MEAN[c]) / CLIP_STD[c];
            tensor[[0, c, y as usize, x as usize]] = normalized;
        }
    }

    tensor
}

/// Output size with the short edge at `size`; the long edge is truncated, not rounded
fn shortest_edge_target(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale_long =
        |long: u32, short: u32| (u64::from(long) * u64::from(size) / u64::from(short)) as u32;
    if width <= height {
        (size, scale_long(height, width).max(size))
    } else {
        (scale_long(width, height).max(size), size)
    }
}

/// Resize (keeping aspect ratio) then take the centered square
pub fn resize_shortest_edge_and_crop(image: &DynamicImage, size: u32) -> DynamicImage {
    let (orig_w, orig_h) = image.dimensions();

    if orig_w == 0 || orig_h == 0 {
        return DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([0, 0, 0])));
    }

    let (new_w, new_h) = shortest_edge_target(orig_w, orig_h, size);

    let resized = image.resize_exact(new_w, new_h, FilterType::CatmullRom);

    let crop_x = (new_w - size) / 2;
    let crop_y = (new_h - size) / 2;

    resized.crop_imm(crop_x, crop_y, size, size)
}
