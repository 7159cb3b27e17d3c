// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fused bias-add and activation kernel.

use rayon::prelude::*;
use tensor_core::{DType, Tensor, TensorError, TensorView};

/// Coefficient `sqrt(2/π)`.
const SQRT_2_OVER_PI: f32 = 0.7978845608;

/// Cubic coefficient in the GELU tanh approximation.
const GELU_COEFF: f32 = 0.044715;

/// The activation applied after the first feed-forward projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// Rectified linear unit, `max(x, 0)`. The feed-forward default.
    Relu,
    /// GELU via the fast tanh approximation used by GPT-2.
    Gelu,
}

impl Default for ActivationKind {
    fn default() -> Self {
        ActivationKind::Relu
    }
}

impl ActivationKind {
    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ActivationKind::Relu => "relu",
            ActivationKind::Gelu => "gelu",
        }
    }
}

/// Adds a per-output-dimension bias and applies the activation in place:
/// `x[r][j] = act(x[r][j] + bias[j])` for every row `r`.
///
/// `x` is treated as `num_elements / bias_len` rows of length `bias_len`;
/// its innermost dimension must equal the bias length. Rows are
/// processed in parallel.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if `bias` is not 1-D or its
/// length does not divide `x`'s innermost dimension, and
/// [`TensorError::UnsupportedDType`] for non-f32 operands.
pub fn add_bias_activation(
    bias: &TensorView<'_>,
    x: &mut Tensor,
    kind: ActivationKind,
) -> Result<(), TensorError> {
    if bias.dtype() != DType::F32 || x.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "add_bias_activation",
            dtype: if bias.dtype() != DType::F32 {
                bias.dtype()
            } else {
                x.dtype()
            },
        });
    }

    let bias_len = bias.shape().num_elements();
    if bias.shape().rank() != 1 || x.shape().last_dim() != Some(bias_len) {
        return Err(TensorError::ShapeMismatch {
            op: "add_bias_activation",
            lhs: x.shape().clone(),
            rhs: bias.shape().clone(),
        });
    }
    if bias_len == 0 {
        return Ok(());
    }

    let b = bias.as_f32_slice();
    let data = x.as_f32_slice_mut();

    data.par_chunks_mut(bias_len).for_each(|row| match kind {
        ActivationKind::Relu => {
            for (v, &bj) in row.iter_mut().zip(b) {
                *v = (*v + bj).max(0.0);
            }
        }
        ActivationKind::Gelu => {
            for (v, &bj) in row.iter_mut().zip(b) {
                *v = gelu_scalar(*v + bj);
            }
        }
    });

    Ok(())
}

/// Computes GELU for a single f32 value:
/// `GELU(x) ≈ 0.5 * x * (1 + tanh(sqrt(2/π) * (x + 0.044715 * x³)))`.
#[inline(always)]
fn gelu_scalar(x: f32) -> f32 {
    let inner = SQRT_2_OVER_PI * (x + GELU_COEFF * x * x * x);
    0.5 * x * (1.0 + inner.tanh())
}
