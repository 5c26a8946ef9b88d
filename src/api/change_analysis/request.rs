// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Change analysis request types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeAnalysisRequest {
    /// Image before the change
    pub image_url_pre: String,
    /// Image after the change
    pub image_url_post: String,
    /// What the caption should focus on
    pub instruction: String,
}
