// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # transformer-layers
//!
//! Numeric kernels and orchestration for the compute-heavy sublayers of a
//! transformer block:
//!
//! - [`FeedForward`]: the position-wise feed-forward pipeline with fused
//!   layer normalization, bias+activation, and residual addition.
//! - [`kernels::masked_softmax`]: row-parallel scaled, masked softmax
//!   over raw attention scores.
//! - Leaf kernels: elementwise copy, bias+activation fusion,
//!   bias+residual addition, in-place layer norm, and a BLAS-style
//!   matrix multiply.
//!
//! # Execution Model
//! Every kernel is a blocking fork-join call: independent rows are
//! distributed across the rayon worker pool and the call returns once
//! all rows complete. Stages inside the pipeline run in strict sequence.
//! Kernel dispatch selects a per-device table of plain functions once per
//! call; devices without an implementation fail with
//! `TensorError::UnsupportedDevice`.

mod config;
mod error;
mod feed_forward;
pub mod kernels;
mod profiler;

pub use config::KernelConfig;
pub use error::LayerError;
pub use feed_forward::FeedForward;
pub use kernels::ActivationKind;
pub use profiler::{NoopProfiler, RecordingProfiler, StageProfiler, StageRecord};
