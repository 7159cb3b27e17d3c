// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! BLAS-style scaled matrix multiplication.

use rayon::prelude::*;
use tensor_core::{DType, Shape, Tensor, TensorError, TensorView};

/// Computes `C = alpha * op(A) * op(B) + beta * C`.
///
/// `op` transposes its operand when the matching flag is set. `A` may be
/// of any rank ≥ 2; its leading dimensions are flattened into rows, so a
/// `(batch, seq, model)` activation multiplies as a
/// `(batch*seq, model)` matrix. `B` must be rank 2. `C` must hold exactly
/// `M * N` elements (its logical shape may be higher-rank).
///
/// `beta = 0` overwrites `C`; `beta = 1` accumulates into it. Rows of `C`
/// are computed in parallel.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the operand inner dimensions
/// disagree or `C` has the wrong element count, and
/// [`TensorError::UnsupportedDType`] for non-f32 operands.
pub fn matmul(
    a: &TensorView<'_>,
    trans_a: bool,
    b: &TensorView<'_>,
    trans_b: bool,
    alpha: f32,
    c: &mut Tensor,
    beta: f32,
) -> Result<(), TensorError> {
    if a.dtype() != DType::F32 || b.dtype() != DType::F32 || c.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "matmul",
            dtype: if a.dtype() != DType::F32 {
                a.dtype()
            } else if b.dtype() != DType::F32 {
                b.dtype()
            } else {
                c.dtype()
            },
        });
    }

    let a_last = match a.shape().last_dim() {
        Some(d) if a.shape().rank() >= 2 => d,
        _ => {
            return Err(TensorError::ShapeMismatch {
                op: "matmul (lhs rank)",
                lhs: a.shape().clone(),
                rhs: b.shape().clone(),
            })
        }
    };
    if b.shape().rank() != 2 {
        return Err(TensorError::ShapeMismatch {
            op: "matmul (rhs rank)",
            lhs: a.shape().clone(),
            rhs: b.shape().clone(),
        });
    }

    // Flatten A's leading dimensions into rows, then apply op().
    let a_rows = a.shape().num_elements() / a_last.max(1);
    let (m, k) = if trans_a { (a_last, a_rows) } else { (a_rows, a_last) };
    let b_dims = b.shape().dims();
    let (kb, n) = if trans_b {
        (b_dims[1], b_dims[0])
    } else {
        (b_dims[0], b_dims[1])
    };

    if k != kb {
        return Err(TensorError::ShapeMismatch {
            op: "matmul",
            lhs: a.shape().clone(),
            rhs: b.shape().clone(),
        });
    }
    if c.shape().num_elements() != m * n {
        return Err(TensorError::ShapeMismatch {
            op: "matmul (output)",
            lhs: Shape::matrix(m, n),
            rhs: c.shape().clone(),
        });
    }
    if m == 0 || n == 0 {
        return Ok(());
    }

    let av = a.as_f32_slice();
    let bv = b.as_f32_slice();
    let cv = c.as_f32_slice_mut();

    let a_at = move |i: usize, p: usize| -> f32 {
        if trans_a {
            av[p * m + i]
        } else {
            av[i * k + p]
        }
    };

    cv.par_chunks_mut(n).enumerate().for_each(|(i, c_row)| {
        if beta == 0.0 {
            c_row.iter_mut().for_each(|x| *x = 0.0);
        } else if beta != 1.0 {
            c_row.iter_mut().for_each(|x| *x *= beta);
        }

        if trans_b {
            // op(B) columns are contiguous rows of B: one dot product per cell.
            for (j, cj) in c_row.iter_mut().enumerate() {
                let b_row = &bv[j * k..(j + 1) * k];
                let mut dot = 0.0f32;
                for (p, &bp) in b_row.iter().enumerate() {
                    dot += a_at(i, p) * bp;
                }
                *cj += alpha * dot;
            }
        } else {
            // ikj order: the inner loop is a saxpy over a contiguous row of
            // B, sequential in memory for both B and C.
            for p in 0..k {
                let aip = alpha * a_at(i, p);
                let b_row = &bv[p * n..(p + 1) * n];
                for (cj, &bj) in c_row.iter_mut().zip(b_row) {
                    *cj += aip * bj;
                }
            }
        }
    });

    Ok(())
}
