// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration from command line and environment

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::analysis::AnalysisModelConfig;
use crate::caption::{DEFAULT_MAX_NEW_TOKENS, DEFAULT_VISUAL_DIM};

pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:8080",
    "http://localhost",
];

/// PulseView API server
#[derive(Parser, Debug, Clone)]
#[command(name = "pulseview")]
#[command(about = "Geospatial spot store and satellite image change analysis API", long_about = None)]
pub struct ServerArgs {
    /// Address the HTTP server binds to
    #[arg(long, env = "PULSEVIEW_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// SQLite database file for spots
    #[arg(long, env = "PULSEVIEW_DATABASE_PATH", default_value = "./data/pulseview.db")]
    pub database_path: PathBuf,

    /// CSV used to seed an empty spot store
    #[arg(long, env = "PULSEVIEW_SEED_CSV", default_value = "./data/urban_spots.csv")]
    pub seed_csv: PathBuf,

    #[arg(
        long,
        env = "VISION_MODEL_DIR",
        default_value = "./models/clip-vit-large-patch14-onnx"
    )]
    pub vision_model_dir: PathBuf,

    #[arg(
        long,
        env = "CAPTION_MODEL_DIR",
        default_value = "./models/qwen2-1.5b-instruct-onnx"
    )]
    pub caption_model_dir: PathBuf,

    /// Hidden width of the vision encoder output
    #[arg(long, env = "VISUAL_DIM", default_value_t = DEFAULT_VISUAL_DIM)]
    pub visual_dim: usize,

    /// Caption length limit (clamped to 1..=512)
    #[arg(long, env = "MAX_NEW_TOKENS", default_value_t = DEFAULT_MAX_NEW_TOKENS)]
    pub max_new_tokens: usize,

    /// Seed for the visual projector weights
    #[arg(long, env = "PROJECTOR_SEED", default_value_t = 0)]
    pub projector_seed: u64,

    /// Allowed CORS origins
    #[arg(
        long,
        env = "CORS_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect::<Vec<_>>()
    )]
    pub cors_origins: Vec<String>,
}

impl ServerArgs {
    pub fn model_config(&self) -> AnalysisModelConfig {
        AnalysisModelConfig {
            vision_model_dir: self.vision_model_dir.clone(),
            caption_model_dir: self.caption_model_dir.clone(),
            visual_dim: self.visual_dim,
            max_new_tokens: self.max_new_tokens,
            projector_seed: self.projector_seed,
        }
    }
}
