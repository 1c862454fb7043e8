//! In-process stand-in for the native delegate library.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use gd_native::{NativeDelegateApi, RawHandle, INVALID_HANDLE};

/// One call received by [`RecordingApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Create {
        precision_loss_allowed: bool,
        quantized_models_allowed: bool,
        inference_preference: i32,
        egl_display: i64,
        egl_context: i64,
    },
    Delete {
        handle: RawHandle,
    },
    BindBuffer {
        handle: RawHandle,
        tensor_index: i32,
        buffer_id: i32,
    },
}

/// Records every call and hands out handles 1, 2, 3, ...
/// A failing instance returns the invalid handle from every create.
#[derive(Debug)]
pub struct RecordingApi {
    calls: Mutex<Vec<NativeCall>>,
    next_handle: AtomicI64,
    fail_create: bool,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_handle: AtomicI64::new(1),
            fail_create: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.lock().clone()
    }

    /// Handles passed to `delete_delegate`, in call order.
    pub fn deleted(&self) -> Vec<RawHandle> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                NativeCall::Delete { handle } => Some(*handle),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NativeCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: NativeCall) {
        self.lock().push(call);
    }
}

impl NativeDelegateApi for RecordingApi {
    fn create_delegate(
        &self,
        precision_loss_allowed: bool,
        quantized_models_allowed: bool,
        inference_preference: i32,
        egl_display: i64,
        egl_context: i64,
    ) -> RawHandle {
        self.record(NativeCall::Create {
            precision_loss_allowed,
            quantized_models_allowed,
            inference_preference,
            egl_display,
            egl_context,
        });
        if self.fail_create {
            INVALID_HANDLE
        } else {
            self.next_handle.fetch_add(1, Ordering::Relaxed)
        }
    }

    fn delete_delegate(&self, handle: RawHandle) {
        self.record(NativeCall::Delete { handle });
    }

    fn bind_buffer_to_tensor(&self, handle: RawHandle, tensor_index: i32, buffer_id: i32) {
        self.record(NativeCall::BindBuffer {
            handle,
            tensor_index,
            buffer_id,
        });
    }
}
