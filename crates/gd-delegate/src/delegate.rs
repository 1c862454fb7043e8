use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use gd_native::{NativeDelegateApi, RawHandle, INVALID_HANDLE};
use tracing::{debug, warn};

use crate::error::{DelegateError, Result};
use crate::options::DelegateOptions;
use crate::tensor::TensorIndex;

/// Tensor index -> external buffer id, as recorded by this side of the boundary.
pub type BoundBuffers = HashMap<i32, i32>;

/// A pluggable execution backend an inference engine can hand part of its
/// graph to. The engine only needs the native handle.
pub trait Delegate {
    /// Short backend name (e.g. "gpu").
    fn name(&self) -> &str;

    /// Current native handle; [`INVALID_HANDLE`] once released.
    fn native_handle(&self) -> RawHandle;
}

/// Owns one native GPU delegate handle and frees it exactly once.
///
/// Creation, buffer binding, inference and release must all happen on the
/// thread holding the graphics context the delegate was created with, so this
/// type is neither `Send` nor `Sync`. It is not `Clone`: one owner per handle.
///
/// If the caller has no EGL context current when the delegate is attached to
/// an interpreter, the native library creates one internally. Inference must
/// then stay on that same thread.
pub struct GpuDelegate {
    handle: RawHandle,
    bound_buffers: BoundBuffers,
    options: DelegateOptions,
    api: Arc<dyn NativeDelegateApi>,
    _thread_bound: PhantomData<*const ()>,
}

impl GpuDelegate {
    /// Create a delegate through the process-wide native library, loading it
    /// on first use.
    pub fn new(options: DelegateOptions) -> Result<Self> {
        let library = gd_native::global()?;
        Self::with_api(library, options)
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DelegateOptions::default())
    }

    /// Create a delegate against an explicit native implementation.
    ///
    /// # Errors
    /// `CreationFailed` if the native call returns the invalid handle. No
    /// object holding the sentinel is ever returned.
    pub fn with_api(api: Arc<dyn NativeDelegateApi>, options: DelegateOptions) -> Result<Self> {
        let handle = api.create_delegate(
            options.precision_loss_allowed,
            options.quantized_models_allowed,
            options.inference_preference.as_raw(),
            options.egl_display,
            options.egl_context,
        );
        if handle == INVALID_HANDLE {
            warn!(?options, "native GPU delegate creation failed");
            return Err(DelegateError::CreationFailed);
        }
        debug!(handle, ?options, "created GPU delegate");

        Ok(Self {
            handle,
            bound_buffers: BoundBuffers::new(),
            options,
            api,
            _thread_bound: PhantomData,
        })
    }

    pub fn native_handle(&self) -> RawHandle {
        self.handle
    }

    pub fn is_valid(&self) -> bool {
        self.handle != INVALID_HANDLE
    }

    /// Options the delegate was created with.
    pub fn options(&self) -> &DelegateOptions {
        &self.options
    }

    /// Bind an externally owned GPU buffer (e.g. a GL SSBO) to `tensor`.
    ///
    /// Must be called with the creation graphics context current. Rebinding a
    /// tensor replaces the previous buffer id.
    pub fn bind_buffer(&mut self, tensor: &impl TensorIndex, buffer_id: i32) -> Result<()> {
        self.bind_buffer_to_index(tensor.index(), buffer_id)
    }

    pub fn bind_buffer_to_index(&mut self, tensor_index: i32, buffer_id: i32) -> Result<()> {
        if !self.is_valid() {
            return Err(DelegateError::InvalidHandle);
        }
        if tensor_index < 0 {
            return Err(DelegateError::InvalidTensorIndex(tensor_index));
        }

        self.api
            .bind_buffer_to_tensor(self.handle, tensor_index, buffer_id);
        self.bound_buffers.insert(tensor_index, buffer_id);
        debug!(handle = self.handle, tensor_index, buffer_id, "bound buffer");
        Ok(())
    }

    /// Bindings made through this wrapper. Does not query the native library.
    pub fn bound_buffers(&self) -> &BoundBuffers {
        &self.bound_buffers
    }

    /// Free the native delegate. Calling this again is a no-op.
    ///
    /// The bound-buffer table is left intact for inspection.
    pub fn release(&mut self) {
        if self.handle == INVALID_HANDLE {
            return;
        }
        debug!(handle = self.handle, "releasing GPU delegate");
        self.api.delete_delegate(self.handle);
        self.handle = INVALID_HANDLE;
    }
}

impl Delegate for GpuDelegate {
    fn name(&self) -> &str {
        "gpu"
    }

    fn native_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Drop for GpuDelegate {
    fn drop(&mut self) {
        if self.is_valid() {
            debug!(handle = self.handle, "GPU delegate dropped without explicit release");
            self.release();
        }
    }
}

impl fmt::Debug for GpuDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuDelegate")
            .field("handle", &self.handle)
            .field("bound_buffers", &self.bound_buffers)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
