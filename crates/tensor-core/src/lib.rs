// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor data model for the transformer inference kernels.
//!
//! This crate provides:
//! - [`Tensor`]: an owned, row-major, device-placed n-dimensional buffer.
//! - [`TensorView`]: a zero-copy borrowed view over a tensor's data.
//! - [`Shape`]: runtime shape descriptors.
//! - [`DType`]: supported element data types (only f32 has compute kernels).
//! - [`Device`]: device placement tag used for kernel dispatch.
//!
//! # Design Goals
//! - Scratch tensors are stack-scoped: allocated on creation, released on drop.
//! - Reshape is the only shape mutation and reallocates only when the
//!   footprint grows, never as a silent truncation.
//! - Allocation failure is surfaced as an error, not an abort.
//! - Clean error types via `thiserror`.

mod device;
mod dtype;
mod error;
mod shape;
mod tensor;

pub use device::{Device, DeviceKind};
pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::{Tensor, TensorView};
