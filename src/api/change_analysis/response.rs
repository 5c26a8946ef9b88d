// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Change analysis response types

use ndarray::{ArrayD, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Either a caption with its mask, or an image download/decode error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChangeAnalysisResponse {
    Success {
        caption: String,
        /// Nested lists, one level per mask axis
        change_mask: Value,
    },
    Failure {
        error: String,
    },
}

impl ChangeAnalysisResponse {
    pub fn success(caption: String, change_mask: &ArrayD<f32>) -> Self {
        Self::Success {
            caption,
            change_mask: mask_to_json(change_mask),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }
}

/// Convert an n-dimensional array to nested JSON lists
///
/// A zero-dimensional array becomes a bare number.
pub fn mask_to_json(mask: &ArrayD<f32>) -> Value {
    nested(mask.view())
}

fn nested(view: ArrayViewD<'_, f32>) -> Value {
    if view.ndim() == 0 {
        let value = view.iter().next().copied().unwrap_or_default();
        return Value::from(f64::from(value));
    }
    Value::Array(
        view.axis_iter(Axis(0))
            .map(nested)
            .collect(),
    )
}
