// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Leaf numeric kernels.
//!
//! Each kernel is a plain function over pre-shaped buffers: it validates
//! its preconditions, then runs tight row loops with rayon distributing
//! independent rows across the worker pool. Kernels either work in place
//! or write a caller-supplied output tensor; none of them allocates.

mod activation;
mod dispatch;
mod elementwise;
mod layer_norm;
mod mat_mul;
mod softmax;

pub use activation::{add_bias_activation, ActivationKind};
pub use dispatch::{
    kernels_for, AddBiasActivationFn, AddInputBiasFn, CopyFn, KernelTable, LayerNormFn,
    MaskedSoftmaxFn, MatMulFn,
};
pub use elementwise::{add_input_bias, copy};
pub use layer_norm::{layer_norm, LAYER_NORM_EPS};
pub use mat_mul::matmul;
pub use softmax::{masked_softmax, SOFTMAX_EPS};
