// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The position-wise feed-forward pipeline.
//!
//! ```text
//! input ──copy──▶ scratch ──layer_norm──▶ ──gemm0──▶ hidden
//!   │                                                  │ add_bias_activation
//!   │                         scratch ◀────gemm1───────┘
//!   └────────────add_input_bias(residual)──▶ output
//! ```
//!
//! Five fixed stages, no branching on data values. The caller's input is
//! never modified; it feeds the residual addition at the end.

use crate::kernels::{kernels_for, ActivationKind};
use crate::profiler::StageProfiler;
use tensor_core::{DType, Shape, Tensor, TensorError};

/// The position-wise two-layer projection of a transformer block, with
/// fused layer normalization, bias+activation, and residual addition:
///
/// `output = input + W2 · act(W1 · LayerNorm(input) + b1) + b2`
///
/// Weight matrices may be stored `(in × out)` or transposed; the
/// orientation flag passed to [`forward`](FeedForward::forward) selects
/// the convention, and all dimension inference follows it.
pub struct FeedForward {
    dense_weight_1: Tensor,
    dense_bias_1: Tensor,
    dense_weight_2: Tensor,
    dense_bias_2: Tensor,
    layer_norm_weight: Tensor,
    layer_norm_bias: Tensor,
    activation: ActivationKind,
}

impl FeedForward {
    /// Creates a feed-forward layer from its parameter tensors.
    ///
    /// Validates structural invariants that are orientation-independent:
    /// weights must be rank-2 f32, biases and layer-norm parameters
    /// rank-1 f32, and the layer-norm weight/bias lengths must agree.
    /// Orientation-dependent dimension checks happen per call in
    /// [`forward`](FeedForward::forward).
    ///
    /// # Errors
    /// Returns [`TensorError::ShapeMismatch`] or
    /// [`TensorError::UnsupportedDType`] on malformed parameters.
    pub fn new(
        dense_weight_1: Tensor,
        dense_bias_1: Tensor,
        dense_weight_2: Tensor,
        dense_bias_2: Tensor,
        layer_norm_weight: Tensor,
        layer_norm_bias: Tensor,
        activation: ActivationKind,
    ) -> Result<Self, TensorError> {
        for t in [
            &dense_weight_1,
            &dense_bias_1,
            &dense_weight_2,
            &dense_bias_2,
            &layer_norm_weight,
            &layer_norm_bias,
        ] {
            if t.dtype() != DType::F32 {
                return Err(TensorError::UnsupportedDType {
                    op: "feed_forward (params)",
                    dtype: t.dtype(),
                });
            }
        }
        for w in [&dense_weight_1, &dense_weight_2] {
            if w.shape().rank() != 2 {
                return Err(TensorError::ShapeMismatch {
                    op: "feed_forward (weight rank)",
                    lhs: Shape::matrix(0, 0),
                    rhs: w.shape().clone(),
                });
            }
        }
        for v in [
            &dense_bias_1,
            &dense_bias_2,
            &layer_norm_weight,
            &layer_norm_bias,
        ] {
            if v.shape().rank() != 1 {
                return Err(TensorError::ShapeMismatch {
                    op: "feed_forward (bias rank)",
                    lhs: Shape::vector(0),
                    rhs: v.shape().clone(),
                });
            }
        }
        if layer_norm_weight.shape() != layer_norm_bias.shape() {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (layer norm params)",
                lhs: layer_norm_weight.shape().clone(),
                rhs: layer_norm_bias.shape().clone(),
            });
        }

        Ok(Self {
            dense_weight_1,
            dense_bias_1,
            dense_weight_2,
            dense_bias_2,
            layer_norm_weight,
            layer_norm_bias,
            activation,
        })
    }

    /// Returns the configured activation.
    pub fn activation(&self) -> ActivationKind {
        self.activation
    }

    /// Runs the feed-forward sublayer over `input`, shaped
    /// `(batch, seq_len, model_dim)`, writing the result into `output`.
    ///
    /// `is_trans_weight` selects the weight orientation: `false` means
    /// weights are stored `(in × out)`, `true` means `(out × in)`. The
    /// output tensor is reshaped to exactly the input shape; the input
    /// tensor is left unmodified.
    ///
    /// All shape preconditions are checked before any allocation or
    /// mutation, so a `ShapeMismatch` failure leaves `output` untouched.
    /// Two scratch tensors (a working copy of the input and the hidden
    /// projection) are allocated per call and dropped on every exit path.
    ///
    /// # Errors
    /// - [`TensorError::ShapeMismatch`] if a weight/bias/norm dimension
    ///   disagrees with the input under the selected orientation.
    /// - [`TensorError::UnsupportedDevice`] if the input's device has no
    ///   kernel table.
    /// - [`TensorError::AllocationFailure`] if a scratch buffer cannot be
    ///   allocated.
    pub fn forward(
        &self,
        input: &Tensor,
        output: &mut Tensor,
        is_trans_weight: bool,
        profiler: &dyn StageProfiler,
    ) -> Result<(), TensorError> {
        let w1 = self.dense_weight_1.shape();
        let dims = input.shape().dims();
        if dims.len() != 3 {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (input rank)",
                lhs: input.shape().clone(),
                rhs: w1.clone(),
            });
        }
        let (batch_size, seq_len, model_dim) = (dims[0], dims[1], dims[2]);

        // Orientation-dependent dimension inference: the flag decides which
        // weight axis is the model dimension.
        let (d_ff, model_dim_weight) = if is_trans_weight {
            (w1.dims()[0], w1.dims()[1])
        } else {
            (w1.dims()[1], w1.dims()[0])
        };
        if model_dim_weight != model_dim {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (weight 1)",
                lhs: input.shape().clone(),
                rhs: w1.clone(),
            });
        }

        let w2 = self.dense_weight_2.shape();
        let (w2_in, w2_out) = if is_trans_weight {
            (w2.dims()[1], w2.dims()[0])
        } else {
            (w2.dims()[0], w2.dims()[1])
        };
        if w2_in != d_ff || w2_out != model_dim {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (weight 2)",
                lhs: Shape::matrix(d_ff, model_dim),
                rhs: w2.clone(),
            });
        }
        if self.dense_bias_1.shape().num_elements() != d_ff {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (bias 1)",
                lhs: Shape::vector(d_ff),
                rhs: self.dense_bias_1.shape().clone(),
            });
        }
        if self.dense_bias_2.shape().num_elements() != model_dim {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (bias 2)",
                lhs: Shape::vector(model_dim),
                rhs: self.dense_bias_2.shape().clone(),
            });
        }
        if self.layer_norm_weight.shape().num_elements() != model_dim {
            return Err(TensorError::ShapeMismatch {
                op: "feed_forward (layer norm)",
                lhs: Shape::vector(model_dim),
                rhs: self.layer_norm_weight.shape().clone(),
            });
        }

        let device = input.device();
        let kernels = kernels_for("feed_forward", device)?;

        tracing::debug!(
            batch_size,
            seq_len,
            model_dim,
            d_ff,
            is_trans_weight,
            %device,
            "feed forward"
        );

        profiler.start_stage("PositionwiseFeedForward", device);
        profiler.start_stage("ffn/Copy", device);

        // Scratch tensors live for this invocation only; drop releases them
        // on every exit path, including early error returns below.
        let mut input_copy = Tensor::empty(DType::F32, device);
        input_copy.reshape(
            Shape::new(vec![batch_size, seq_len, model_dim]),
            device,
        )?;
        let mut hidden = Tensor::empty(DType::F32, device);
        hidden.reshape(Shape::matrix(batch_size * seq_len, d_ff), device)?;

        (kernels.copy)(&input.view(), &mut input_copy)?;
        output.reshape(Shape::new(vec![batch_size, seq_len, model_dim]), device)?;

        profiler.end_stage("ffn/Copy", device);
        profiler.start_stage("ffn/LayerNorm", device);

        (kernels.layer_norm)(
            &self.layer_norm_weight.view(),
            &self.layer_norm_bias.view(),
            &mut input_copy,
        )?;

        profiler.end_stage("ffn/LayerNorm", device);
        profiler.start_stage("ffn/gemm0", device);

        // (batch*seq, model_dim) x op(W1) -> (batch*seq, d_ff)
        (kernels.matmul)(
            &input_copy.view(),
            false,
            &self.dense_weight_1.view(),
            is_trans_weight,
            1.0,
            &mut hidden,
            0.0,
        )?;

        profiler.end_stage("ffn/gemm0", device);
        profiler.start_stage("ffn/AddBiasAct", device);

        (kernels.add_bias_activation)(&self.dense_bias_1.view(), &mut hidden, self.activation)?;

        profiler.end_stage("ffn/AddBiasAct", device);
        profiler.start_stage("ffn/gemm1", device);

        // (batch*seq, d_ff) x op(W2) -> back into the working copy.
        (kernels.matmul)(
            &hidden.view(),
            false,
            &self.dense_weight_2.view(),
            is_trans_weight,
            1.0,
            &mut input_copy,
            0.0,
        )?;

        profiler.end_stage("ffn/gemm1", device);
        profiler.start_stage("ffn/AddInputBias", device);

        (kernels.add_input_bias)(
            &input.view(),
            &input_copy.view(),
            &self.dense_bias_2.view(),
            output,
        )?;

        profiler.end_stage("ffn/AddInputBias", device);
        profiler.end_stage("PositionwiseFeedForward", device);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::NoopProfiler;
    use tensor_core::{Device, Shape};

    fn zeros(dims: Vec<usize>) -> Tensor {
        Tensor::zeros(Shape::new(dims), DType::F32, Device::cpu()).unwrap()
    }

    fn layer(model_dim: usize, d_ff: usize) -> FeedForward {
        FeedForward::new(
            zeros(vec![model_dim, d_ff]),
            zeros(vec![d_ff]),
            zeros(vec![d_ff, model_dim]),
            zeros(vec![model_dim]),
            Tensor::from_f32(Shape::vector(model_dim), &vec![1.0; model_dim]).unwrap(),
            zeros(vec![model_dim]),
            ActivationKind::Relu,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_non_matrix_weight() {
        let result = FeedForward::new(
            zeros(vec![4]),
            zeros(vec![8]),
            zeros(vec![8, 4]),
            zeros(vec![4]),
            zeros(vec![4]),
            zeros(vec![4]),
            ActivationKind::Relu,
        );
        assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_new_rejects_norm_param_mismatch() {
        let result = FeedForward::new(
            zeros(vec![4, 8]),
            zeros(vec![8]),
            zeros(vec![8, 4]),
            zeros(vec![4]),
            zeros(vec![4]),
            zeros(vec![5]),
            ActivationKind::Relu,
        );
        assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forward_output_shape_matches_input() {
        let ffn = layer(4, 8);
        let input = zeros(vec![2, 3, 4]);
        let mut output = Tensor::empty(DType::F32, Device::cpu());

        ffn.forward(&input, &mut output, false, &NoopProfiler).unwrap();

        assert_eq!(output.shape(), input.shape());
    }

    #[test]
    fn test_forward_rejects_model_dim_mismatch() {
        let ffn = layer(4, 8);
        let input = zeros(vec![1, 2, 5]); // model_dim 5 != 4
        let mut output = Tensor::empty(DType::F32, Device::cpu());

        let result = ffn.forward(&input, &mut output, false, &NoopProfiler);
        assert!(matches!(
            result,
            Err(TensorError::ShapeMismatch { op: "feed_forward (weight 1)", .. })
        ));
    }

    #[test]
    fn test_forward_rejects_bad_weight_2() {
        // W2 output dim (3) != model_dim (4).
        let result_layer = FeedForward::new(
            zeros(vec![4, 8]),
            zeros(vec![8]),
            zeros(vec![8, 3]),
            zeros(vec![4]),
            zeros(vec![4]),
            zeros(vec![4]),
            ActivationKind::Relu,
        )
        .unwrap();
        let input = zeros(vec![1, 2, 4]);
        let mut output = Tensor::empty(DType::F32, Device::cpu());

        let result = result_layer.forward(&input, &mut output, false, &NoopProfiler);
        assert!(matches!(
            result,
            Err(TensorError::ShapeMismatch { op: "feed_forward (weight 2)", .. })
        ));
    }

    #[test]
    fn test_forward_rejects_rank_2_input() {
        let ffn = layer(4, 8);
        let input = zeros(vec![2, 4]);
        let mut output = Tensor::empty(DType::F32, Device::cpu());

        let result = ffn.forward(&input, &mut output, false, &NoopProfiler);
        assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forward_unsupported_device() {
        let ffn = layer(4, 8);
        let input = Tensor::zeros(Shape::new(vec![1, 2, 4]), DType::F32, Device::cuda(0)).unwrap();
        let mut output = Tensor::empty(DType::F32, Device::cuda(0));

        let result = ffn.forward(&input, &mut output, false, &NoopProfiler);
        assert!(matches!(result, Err(TensorError::UnsupportedDevice { .. })));
    }
}
