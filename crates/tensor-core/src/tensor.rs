// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::{DType, Device, Shape, TensorError};

/// An owned, n-dimensional tensor stored in contiguous memory.
///
/// `Tensor` is the primary data carrier in the kernel pipeline. It owns
/// its data buffer, carries a [`Device`] placement tag used for kernel
/// dispatch, and exposes immutable views via [`TensorView`].
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat byte buffer. The
/// buffer is always at least `shape.size_bytes(dtype)` long; `reshape`
/// may leave excess capacity behind when shrinking.
///
/// # Lifecycle
/// Pipeline temporaries are created with [`Tensor::empty`], sized with
/// [`Tensor::reshape`], and released when they go out of scope. Ownership
/// never escapes the invocation that created them.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    device: Device,
    data: Vec<u8>,
}

impl Tensor {
    /// Creates an empty placeholder tensor with no storage.
    ///
    /// The tensor must be [`reshape`](Tensor::reshape)d to a concrete
    /// shape before any kernel touches it.
    pub fn empty(dtype: DType, device: Device) -> Self {
        Self {
            shape: Shape::vector(0),
            dtype,
            device,
            data: Vec::new(),
        }
    }

    /// Creates a new zero-filled tensor on the given device.
    ///
    /// # Errors
    /// Returns [`TensorError::AllocationFailure`] if the buffer cannot
    /// be allocated.
    pub fn zeros(shape: Shape, dtype: DType, device: Device) -> Result<Self, TensorError> {
        let data = alloc_zeroed(shape.size_bytes(dtype), device)?;
        Ok(Self {
            shape,
            dtype,
            device,
            data,
        })
    }

    /// Creates a CPU tensor from a slice of `f32` values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_f32_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        if values.len() != shape.num_elements() {
            return Err(TensorError::BufferSizeMismatch {
                expected: shape.size_bytes(DType::F32),
                actual: values.len() * DType::F32.size_bytes(),
            });
        }
        // SAFETY: reinterpreting &[f32] as &[u8] is safe for Copy types.
        let byte_slice =
            unsafe { std::slice::from_raw_parts(values.as_ptr() as *const u8, values.len() * 4) };
        Ok(Self {
            shape,
            dtype: DType::F32,
            device: Device::cpu(),
            data: byte_slice.to_vec(),
        })
    }

    /// (Re)shapes this tensor to `shape` on `device`.
    ///
    /// Idempotent when the shape and device already match. When the new
    /// footprint exceeds the current buffer, the buffer is reallocated;
    /// otherwise the existing storage is reinterpreted in place. Contents
    /// are unspecified after a reshape; callers are expected to overwrite
    /// the tensor before reading it.
    ///
    /// # Errors
    /// Returns [`TensorError::AllocationFailure`] if a grow-reallocation
    /// fails.
    pub fn reshape(
        &mut self,
        shape: Shape,
        device: Device,
    ) -> Result<(), TensorError> {
        if self.shape == shape && self.device == device {
            return Ok(());
        }
        let needed = shape.size_bytes(self.dtype);
        if needed > self.data.len() {
            self.data = alloc_zeroed(needed, device)?;
        }
        self.shape = shape;
        self.device = device;
        Ok(())
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the tensor's device placement.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            dtype: self.dtype,
            data: &self.data,
        }
    }

    /// Returns the memory footprint of the backing buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Interprets the buffer as a slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice(&self) -> &[f32] {
        assert_eq!(
            self.dtype,
            DType::F32,
            "as_f32_slice called on {:?} tensor",
            self.dtype
        );
        // SAFETY: the buffer holds at least num_elements f32 values and
        // originates from an f32-sized allocation.
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr() as *const f32, self.shape.num_elements())
        }
    }

    /// Interprets the buffer as a mutable slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice_mut(&mut self) -> &mut [f32] {
        assert_eq!(
            self.dtype,
            DType::F32,
            "as_f32_slice_mut called on {:?} tensor",
            self.dtype
        );
        let n = self.shape.num_elements();
        unsafe { std::slice::from_raw_parts_mut(self.data.as_mut_ptr() as *mut f32, n) }
    }

    /// Fills the tensor with a constant `f32` value.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn fill_f32(&mut self, value: f32) {
        let slice = self.as_f32_slice_mut();
        slice.iter_mut().for_each(|x| *x = value);
    }
}

/// Allocates a zero-initialised byte buffer, surfacing exhaustion as an
/// error instead of aborting the process.
fn alloc_zeroed(len: usize, device: Device) -> Result<Vec<u8>, TensorError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| TensorError::AllocationFailure { bytes: len, device })?;
    data.resize(len, 0);
    Ok(data)
}

/// A borrowed, read-only view over a [`Tensor`]'s data.
///
/// Views are zero-copy and tied to the lifetime of the source tensor,
/// enforced by the borrow checker.
#[derive(Debug)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    dtype: DType,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &Shape {
        self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Interprets the view as a slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice(&self) -> &[f32] {
        assert_eq!(
            self.dtype,
            DType::F32,
            "as_f32_slice called on {:?} view",
            self.dtype
        );
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr() as *const f32, self.shape.num_elements())
        }
    }
}
