// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the layer crate.

/// Errors raised above the kernel level.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// A tensor kernel failed (shape, allocation, device, or dtype).
    #[error("kernel error: {0}")]
    Kernel(#[from] tensor_core::TensorError),

    /// Configuration parsing or validation failed.
    #[error("configuration error: {0}")]
    Config(String),
}
