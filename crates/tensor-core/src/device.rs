// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device placement tags.

use std::fmt;

/// The kind of device a tensor's buffer is placed on.
///
/// Kernel dispatch matches on `DeviceKind` to select a static kernel
/// table; kinds without an implementation fail with
/// [`TensorError::UnsupportedDevice`](crate::TensorError::UnsupportedDevice)
/// at the first dispatch rather than deep inside a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DeviceKind {
    /// Host CPU.
    Cpu,
    /// CUDA accelerator (placement tag only; no kernels ship for it).
    Cuda,
}

/// A concrete device: kind plus ordinal index.
///
/// The index distinguishes multiple accelerators of the same kind and is
/// ignored for [`DeviceKind::Cpu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Device {
    kind: DeviceKind,
    index: u32,
}

impl Device {
    /// The host CPU device.
    pub fn cpu() -> Self {
        Self {
            kind: DeviceKind::Cpu,
            index: 0,
        }
    }

    /// A CUDA device with the given ordinal.
    pub fn cuda(index: u32) -> Self {
        Self {
            kind: DeviceKind::Cuda,
            index,
        }
    }

    /// Returns the device kind.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Returns the device ordinal.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Cuda => write!(f, "cuda:{}", self.index),
        }
    }
}
