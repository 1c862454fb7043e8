use std::fmt::Debug;

/// Opaque handle issued by the native library. Its bits are never interpreted
/// on this side of the boundary.
pub type RawHandle = i64;

/// Sentinel meaning "no delegate": creation failed or the delegate was released.
pub const INVALID_HANDLE: RawHandle = 0;

/// The three calls the native GPU delegate library exposes.
///
/// [`crate::NativeLibrary`] forwards them to the loaded shared object; tests
/// substitute a recording double. All calls touching a given handle must be
/// made from the thread that owns the graphics context it was created on.
pub trait NativeDelegateApi: Send + Sync + Debug {
    /// Create a delegate. Returns [`INVALID_HANDLE`] on internal failure.
    ///
    /// Parameter order matches the native entry point: display comes before
    /// context.
    fn create_delegate(
        &self,
        precision_loss_allowed: bool,
        quantized_models_allowed: bool,
        inference_preference: i32,
        egl_display: i64,
        egl_context: i64,
    ) -> RawHandle;

    /// Free a delegate previously returned by `create_delegate`.
    fn delete_delegate(&self, handle: RawHandle);

    /// Bind an externally owned GPU buffer (e.g. a GL SSBO id) to a tensor slot.
    fn bind_buffer_to_tensor(&self, handle: RawHandle, tensor_index: i32, buffer_id: i32);
}
