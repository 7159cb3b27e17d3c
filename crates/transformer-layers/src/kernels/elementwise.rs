// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Elementwise kernels: copy and fused bias+residual addition.

use rayon::prelude::*;
use tensor_core::{DType, Tensor, TensorError, TensorView};

/// Copies `src` into `dst` elementwise.
///
/// `dst` must already be shaped to hold `src`'s element count; the copy
/// does not resize.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the element counts differ
/// and [`TensorError::UnsupportedDType`] for non-f32 operands.
pub fn copy(src: &TensorView<'_>, dst: &mut Tensor) -> Result<(), TensorError> {
    if src.dtype() != DType::F32 || dst.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "copy",
            dtype: if src.dtype() != DType::F32 {
                src.dtype()
            } else {
                dst.dtype()
            },
        });
    }
    if src.shape().num_elements() != dst.shape().num_elements() {
        return Err(TensorError::ShapeMismatch {
            op: "copy",
            lhs: src.shape().clone(),
            rhs: dst.shape().clone(),
        });
    }

    dst.as_f32_slice_mut().copy_from_slice(src.as_f32_slice());
    Ok(())
}

/// Fused residual + bias addition:
/// `output[r][j] = residual[r][j] + projected[r][j] + bias[j]`.
///
/// `residual`, `projected`, and `output` must have equal element counts;
/// `bias` is 1-D and broadcast over rows of its length. Rows are
/// processed in parallel.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] on any element-count or bias
/// incompatibility and [`TensorError::UnsupportedDType`] for non-f32
/// operands.
pub fn add_input_bias(
    residual: &TensorView<'_>,
    projected: &TensorView<'_>,
    bias: &TensorView<'_>,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    for dtype in [
        residual.dtype(),
        projected.dtype(),
        bias.dtype(),
        output.dtype(),
    ] {
        if dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op: "add_input_bias",
                dtype,
            });
        }
    }

    let n = residual.shape().num_elements();
    if projected.shape().num_elements() != n || output.shape().num_elements() != n {
        return Err(TensorError::ShapeMismatch {
            op: "add_input_bias",
            lhs: residual.shape().clone(),
            rhs: if projected.shape().num_elements() != n {
                projected.shape().clone()
            } else {
                output.shape().clone()
            },
        });
    }
    let bias_len = bias.shape().num_elements();
    if bias.shape().rank() != 1 || bias_len == 0 || n % bias_len != 0 {
        return Err(TensorError::ShapeMismatch {
            op: "add_input_bias (bias)",
            lhs: residual.shape().clone(),
            rhs: bias.shape().clone(),
        });
    }

    let r = residual.as_f32_slice();
    let p = projected.as_f32_slice();
    let b = bias.as_f32_slice();
    let out = output.as_f32_slice_mut();

    out.par_chunks_mut(bias_len)
        .zip(r.par_chunks(bias_len).zip(p.par_chunks(bias_len)))
        .for_each(|(o_row, (r_row, p_row))| {
            for j in 0..bias_len {
                o_row[j] = r_row[j] + p_row[j] + b[j];
            }
        });

    Ok(())
}
