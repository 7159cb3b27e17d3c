// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Masked softmax over attention scores.

use rayon::prelude::*;
use tensor_core::{DType, Tensor, TensorError, TensorView};

/// Denominator epsilon guarding all-masked rows against division by zero.
pub const SOFTMAX_EPS: f32 = 1e-6;

/// Scaled, masked softmax applied in place to a raw attention score
/// buffer shaped `(batch, heads, query_len, key_len)`:
///
/// `p_j = exp(scaler * x_j + mask_j) / (Σ_k exp(scaler * x_k + mask_k) + ε)`
///
/// Each `(batch, head, query)` row of length `key_len` is normalized
/// independently; rows run in parallel, and each row makes three sweeps
/// (exponentiate, sum, scale) since the sum is unknown until the first
/// sweep completes.
///
/// The additive `mask` is head-agnostic: the mask row for flat row `i` is
/// at offset `(i / (heads * key_len)) * key_len`. The caller is
/// responsible for supplying a mask large enough for that addressing;
/// mask/score consistency is not independently validated here.
///
/// No max-subtraction stabilization is performed before exponentiation;
/// inputs are assumed bounded by the scaler and mask. Rows fully
/// suppressed by the mask yield near-zero probabilities, not NaN, due to
/// the epsilon-stabilized denominator.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if `scores` is not rank 4 and
/// [`TensorError::UnsupportedDType`] for non-f32 buffers.
pub fn masked_softmax(
    scores: &mut Tensor,
    mask: &TensorView<'_>,
    scaler: f32,
) -> Result<(), TensorError> {
    if scores.dtype() != DType::F32 || mask.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "masked_softmax",
            dtype: if scores.dtype() != DType::F32 {
                scores.dtype()
            } else {
                mask.dtype()
            },
        });
    }
    if scores.shape().rank() != 4 {
        return Err(TensorError::ShapeMismatch {
            op: "masked_softmax",
            lhs: scores.shape().clone(),
            rhs: mask.shape().clone(),
        });
    }

    let dims = scores.shape().dims();
    let heads = dims[1];
    let key_len = dims[3];
    if key_len == 0 || scores.shape().num_elements() == 0 {
        return Ok(());
    }

    let m = mask.as_f32_slice();
    let data = scores.as_f32_slice_mut();

    data.par_chunks_mut(key_len).enumerate().for_each(|(i, row)| {
        let mask_offset = i / (heads * key_len) * key_len;
        let mask_row = &m[mask_offset..mask_offset + key_len];

        for (x, &mv) in row.iter_mut().zip(mask_row) {
            *x = (*x * scaler + mv).exp();
        }
        let sum: f32 = row.iter().sum();
        let coef = 1.0 / (sum + SOFTMAX_EPS);
        for x in row.iter_mut() {
            *x *= coef;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::Shape;

    fn approx_eq(a: &[f32], b: &[f32], tol: f32) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn test_uniform_row() {
        // Equal scores, zero mask → uniform probabilities.
        let mut scores =
            Tensor::from_f32(Shape::new(vec![1, 1, 1, 3]), &[1.0, 1.0, 1.0]).unwrap();
        let mask = Tensor::from_f32(Shape::new(vec![1, 1, 3]), &[0.0, 0.0, 0.0]).unwrap();

        masked_softmax(&mut scores, &mask.view(), 1.0).unwrap();

        assert!(approx_eq(scores.as_f32_slice(), &[1.0 / 3.0; 3], 1e-5));
    }

    #[test]
    fn test_row_sums_to_one() {
        let mut scores = Tensor::from_f32(
            Shape::new(vec![1, 2, 2, 3]),
            &[0.1, 0.9, -0.4, 1.2, 0.0, 0.3, -1.0, 0.5, 0.7, 0.2, -0.2, 1.1],
        )
        .unwrap();
        let mask = Tensor::from_f32(Shape::new(vec![1, 2, 3]), &[0.0; 6]).unwrap();

        masked_softmax(&mut scores, &mask.view(), 0.5).unwrap();

        let r = scores.as_f32_slice();
        for row in r.chunks(3) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "row sum {sum} not ~1");
        }
    }

    #[test]
    fn test_mask_suppresses_positions() {
        // A large negative mask entry drives that position to ~0.
        let mut scores =
            Tensor::from_f32(Shape::new(vec![1, 1, 1, 2]), &[1.0, 1.0]).unwrap();
        let mask = Tensor::from_f32(Shape::new(vec![1, 1, 2]), &[0.0, -1e4]).unwrap();

        masked_softmax(&mut scores, &mask.view(), 1.0).unwrap();

        let r = scores.as_f32_slice();
        assert!((r[0] - 1.0).abs() < 1e-4);
        assert!(r[1] < 1e-6);
    }

    #[test]
    fn test_fully_masked_row_is_near_zero_not_nan() {
        let mut scores =
            Tensor::from_f32(Shape::new(vec![1, 1, 1, 3]), &[1.0, 2.0, 3.0]).unwrap();
        let mask = Tensor::from_f32(Shape::new(vec![1, 1, 3]), &[-50.0; 3]).unwrap();

        masked_softmax(&mut scores, &mask.view(), 1.0).unwrap();

        for &p in scores.as_f32_slice() {
            assert!(p.is_finite());
            assert!(p >= 0.0 && p < 1e-9, "expected near-zero, got {p}");
        }
    }

    #[test]
    fn test_mask_shared_across_heads() {
        // Two heads, identical scores: the single mask row applies to both,
        // so both heads produce identical probabilities.
        let mut scores = Tensor::from_f32(
            Shape::new(vec![1, 2, 1, 2]),
            &[0.5, 1.5, 0.5, 1.5],
        )
        .unwrap();
        let mask = Tensor::from_f32(Shape::new(vec![1, 1, 2]), &[0.0, -1e4]).unwrap();

        masked_softmax(&mut scores, &mask.view(), 1.0).unwrap();

        let r = scores.as_f32_slice();
        assert!(approx_eq(&r[0..2], &r[2..4], 1e-6));
        assert!(r[1] < 1e-6 && r[3] < 1e-6);
    }

    #[test]
    fn test_rank_validation() {
        let mut scores = Tensor::from_f32(Shape::matrix(2, 2), &[0.0; 4]).unwrap();
        let mask = Tensor::from_f32(Shape::new(vec![1, 1, 2]), &[0.0; 2]).unwrap();

        let result = masked_softmax(&mut scores, &mask.view(), 1.0);
        assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
    }
}
