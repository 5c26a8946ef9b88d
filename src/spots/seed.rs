// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup seeding of the spot store from a CSV file

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::model::NewSpot;
use super::store::SpotStore;

/// What a seeding run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already had rows; nothing was read
    SkippedNotEmpty(u64),
    /// The seed file does not exist
    MissingFile,
    /// Number of rows inserted
    Loaded(usize),
}

/// One CSV row; columns other than these are ignored
#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    latitude: f64,
    longitude: f64,
}

impl From<SeedRow> for NewSpot {
    fn from(row: SeedRow) -> Self {
        NewSpot::new(row.name, row.category, row.latitude, row.longitude)
    }
}

/// Parse seed rows from any CSV reader
pub fn read_seed_rows<R: std::io::Read>(reader: R) -> Result<Vec<NewSpot>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut spots = Vec::new();
    for (index, record) in csv_reader.deserialize::<SeedRow>().enumerate() {
        // +2: header line plus 1-based numbering
        let row = record.with_context(|| format!("invalid seed row at line {}", index + 2))?;
        spots.push(row.into());
    }
    Ok(spots)
}

/// Load spots from `csv_path` if, and only if, the store is empty
pub async fn seed_from_csv(store: &SpotStore, csv_path: impl AsRef<Path>) -> Result<SeedOutcome> {
    let csv_path = csv_path.as_ref();

    let existing = store.count_spots().await?;
    if existing > 0 {
        info!("Spot store already holds {} spots, skipping seed", existing);
        return Ok(SeedOutcome::SkippedNotEmpty(existing));
    }

    if !csv_path.exists() {
        warn!("⚠️ Seed file not found: {}", csv_path.display());
        return Ok(SeedOutcome::MissingFile);
    }

    info!("No spots found, loading from {}", csv_path.display());
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open seed file {}", csv_path.display()))?;
    let spots = read_seed_rows(file)
        .with_context(|| format!("failed to parse seed file {}", csv_path.display()))?;

    let loaded = store.insert_spots(spots).await?;
    info!("✅ Loaded {} spots into the store", loaded);
    Ok(SeedOutcome::Loaded(loaded))
}
