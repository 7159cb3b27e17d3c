// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.
//!
//! All failures are precondition violations or resource failures the
//! kernels cannot resolve locally; they carry enough context (operation
//! name, expected vs. actual shapes, device) to diagnose at the caller.

use crate::{Device, Shape};

/// Errors that can occur during tensor allocation and kernel execution.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// Two tensors have incompatible shapes for the requested operation.
    /// Checked before any allocation or mutation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// The provided buffer size does not match the expected size for the
    /// given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Allocating a tensor buffer failed (resource exhaustion).
    #[error("failed to allocate {bytes} bytes on {device}")]
    AllocationFailure { bytes: usize, device: Device },

    /// The requested device has no implementation for this kernel.
    #[error("no {op} kernel for device {device}")]
    UnsupportedDevice { op: &'static str, device: Device },

    /// The requested data type is not supported for this operation.
    #[error("unsupported dtype {dtype:?} for operation {op}")]
    UnsupportedDType {
        op: &'static str,
        dtype: crate::DType,
    },
}
