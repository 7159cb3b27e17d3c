// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-device kernel dispatch.
//!
//! Dispatch is a match on [`DeviceKind`] selecting a static table of
//! plain function pointers, looked up once per pipeline call, so hot
//! loops never pay a virtual-call indirection. A device kind without a
//! table fails with `UnsupportedDevice` at the first dispatch.

use super::{activation, elementwise, layer_norm, mat_mul, softmax, ActivationKind};
use tensor_core::{Device, DeviceKind, Tensor, TensorError, TensorView};

/// Elementwise copy: `copy(src, dst)`.
pub type CopyFn = fn(&TensorView<'_>, &mut Tensor) -> Result<(), TensorError>;

/// In-place layer normalization: `layer_norm(gamma, beta, x)`.
pub type LayerNormFn =
    fn(&TensorView<'_>, &TensorView<'_>, &mut Tensor) -> Result<(), TensorError>;

/// Scaled GEMM: `matmul(a, trans_a, b, trans_b, alpha, c, beta)`.
pub type MatMulFn = fn(
    &TensorView<'_>,
    bool,
    &TensorView<'_>,
    bool,
    f32,
    &mut Tensor,
    f32,
) -> Result<(), TensorError>;

/// Fused bias + activation: `add_bias_activation(bias, x, kind)`.
pub type AddBiasActivationFn =
    fn(&TensorView<'_>, &mut Tensor, ActivationKind) -> Result<(), TensorError>;

/// Fused residual + bias: `add_input_bias(residual, projected, bias, out)`.
pub type AddInputBiasFn = fn(
    &TensorView<'_>,
    &TensorView<'_>,
    &TensorView<'_>,
    &mut Tensor,
) -> Result<(), TensorError>;

/// In-place masked softmax: `masked_softmax(scores, mask, scaler)`.
pub type MaskedSoftmaxFn = fn(&mut Tensor, &TensorView<'_>, f32) -> Result<(), TensorError>;

/// The set of leaf kernels for one device kind.
#[derive(Clone, Copy)]
pub struct KernelTable {
    pub copy: CopyFn,
    pub layer_norm: LayerNormFn,
    pub matmul: MatMulFn,
    pub add_bias_activation: AddBiasActivationFn,
    pub add_input_bias: AddInputBiasFn,
    pub masked_softmax: MaskedSoftmaxFn,
}

static CPU_KERNELS: KernelTable = KernelTable {
    copy: elementwise::copy,
    layer_norm: layer_norm::layer_norm,
    matmul: mat_mul::matmul,
    add_bias_activation: activation::add_bias_activation,
    add_input_bias: elementwise::add_input_bias,
    masked_softmax: softmax::masked_softmax,
};

/// Resolves the kernel table for `device`.
///
/// `op` names the caller for error context.
///
/// # Errors
/// Returns [`TensorError::UnsupportedDevice`] for device kinds without an
/// implementation.
pub fn kernels_for(op: &'static str, device: Device) -> Result<&'static KernelTable, TensorError> {
    match device.kind() {
        DeviceKind::Cpu => Ok(&CPU_KERNELS),
        DeviceKind::Cuda => Err(TensorError::UnsupportedDevice { op, device }),
    }
}
