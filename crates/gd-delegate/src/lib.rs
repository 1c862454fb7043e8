//! `gd-delegate` - Managed-lifetime wrapper around the native GPU inference delegate.
//!
//! This crate provides:
//! - `DelegateOptions` / `InferencePreference`, the creation-time configuration
//! - `GpuDelegate`, which owns one native handle, tracks bound buffers and
//!   frees the handle exactly once
//! - The `Delegate` and `TensorIndex` traits the inference engine side uses
//! - `DelegateRegistry`, a by-name factory table for embedding frameworks

pub mod delegate;
pub mod error;
pub mod options;
pub mod registry;
pub mod tensor;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use delegate::{BoundBuffers, Delegate, GpuDelegate};
pub use error::{DelegateError, Result};
pub use gd_native::{RawHandle, INVALID_HANDLE};
pub use options::{DelegateOptions, InferencePreference};
pub use registry::{DelegateFactory, DelegateRegistry};
pub use tensor::{TensorIndex, TensorRef};
