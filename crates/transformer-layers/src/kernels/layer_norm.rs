// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! In-place layer normalization.

use rayon::prelude::*;
use tensor_core::{DType, Tensor, TensorError, TensorView};

/// Variance-stabilising epsilon for layer normalization.
pub const LAYER_NORM_EPS: f32 = 1e-5;

/// Applies layer normalization in place over the last dimension:
///
/// `x = gamma * (x - mean) / sqrt(var + eps) + beta`
///
/// Mean and variance are computed per row (per token); `gamma` and `beta`
/// are the learned affine parameters, 1-D with length equal to the last
/// dimension. Rows are normalized in parallel.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if `gamma`/`beta` do not match
/// the last dimension and [`TensorError::UnsupportedDType`] for non-f32
/// operands.
pub fn layer_norm(
    gamma: &TensorView<'_>,
    beta: &TensorView<'_>,
    x: &mut Tensor,
) -> Result<(), TensorError> {
    if gamma.dtype() != DType::F32 || beta.dtype() != DType::F32 || x.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "layer_norm",
            dtype: if gamma.dtype() != DType::F32 {
                gamma.dtype()
            } else if beta.dtype() != DType::F32 {
                beta.dtype()
            } else {
                x.dtype()
            },
        });
    }

    let last_dim = match x.shape().last_dim() {
        Some(d) if d > 0 => d,
        _ => return Ok(()),
    };
    if gamma.shape().rank() != 1 || gamma.shape().num_elements() != last_dim {
        return Err(TensorError::ShapeMismatch {
            op: "layer_norm (gamma)",
            lhs: x.shape().clone(),
            rhs: gamma.shape().clone(),
        });
    }
    if beta.shape().rank() != 1 || beta.shape().num_elements() != last_dim {
        return Err(TensorError::ShapeMismatch {
            op: "layer_norm (beta)",
            lhs: x.shape().clone(),
            rhs: beta.shape().clone(),
        });
    }

    let g = gamma.as_f32_slice();
    let b = beta.as_f32_slice();
    let data = x.as_f32_slice_mut();

    data.par_chunks_mut(last_dim).for_each(|row| {
        let mean: f32 = row.iter().sum::<f32>() / last_dim as f32;
        let var: f32 =
            row.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / last_dim as f32;
        let inv_std = 1.0 / (var + LAYER_NORM_EPS).sqrt();
        for j in 0..last_dim {
            row[j] = g[j] * (row[j] - mean) * inv_std + b[j];
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
    fn test_layer_norm_basic() {
        // gamma=1, beta=0 → zero mean, unit variance per row.
        let mut x = Tensor::from_f32(Shape::vector(5), &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let gamma = Tensor::from_f32(Shape::vector(5), &[1.0; 5]).unwrap();
        let beta = Tensor::from_f32(Shape::vector(5), &[0.0; 5]).unwrap();

        layer_norm(&gamma.view(), &beta.view(), &mut x).unwrap();

        let r = x.as_f32_slice();
        let mean: f32 = r.iter().sum::<f32>() / 5.0;
        assert!(mean.abs() < 1e-5);
        let var: f32 = r.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / 5.0;
        assert!((var - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_layer_norm_affine() {
        // Constant input normalizes to 0; output equals beta.
        let mut x = Tensor::from_f32(Shape::vector(3), &[5.0, 5.0, 5.0]).unwrap();
        let gamma = Tensor::from_f32(Shape::vector(3), &[2.0; 3]).unwrap();
        let beta = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();

        layer_norm(&gamma.view(), &beta.view(), &mut x).unwrap();

        assert!(approx_eq(x.as_f32_slice(), &[1.0, 2.0, 3.0], 1e-2));
    }

    #[test]
    fn test_layer_norm_per_row() {
        let mut x = Tensor::from_f32(
            Shape::matrix(2, 3),
            &[1.0, 2.0, 3.0, 10.0, 20.0, 30.0],
        )
        .unwrap();
        let gamma = Tensor::from_f32(Shape::vector(3), &[1.0; 3]).unwrap();
        let beta = Tensor::from_f32(Shape::vector(3), &[0.0; 3]).unwrap();

        layer_norm(&gamma.view(), &beta.view(), &mut x).unwrap();

        let r = x.as_f32_slice();
        let mean0: f32 = r[0..3].iter().sum::<f32>() / 3.0;
        let mean1: f32 = r[3..6].iter().sum::<f32>() / 3.0;
        assert!(mean0.abs() < 1e-5);
        assert!(mean1.abs() < 1e-5);
        // Both rows normalize to the same values despite the 10x scale.
        assert!(approx_eq(&r[0..3], &r[3..6], 1e-4));
    }

    #[test]
    fn test_layer_norm_gamma_mismatch() {
        let mut x = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
        let gamma = Tensor::from_f32(Shape::vector(4), &[1.0; 4]).unwrap();
        let beta = Tensor::from_f32(Shape::vector(3), &[0.0; 3]).unwrap();

        let result = layer_norm(&gamma.view(), &beta.view(), &mut x);
        assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
    }
}
