mod context;
mod error;
mod logging;
mod types;

pub use context::*;
pub use error::*;
pub use types::*;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::AssertUnwindSafe;

use gd_delegate::{DelegateError, DelegateOptions, GpuDelegate, INVALID_HANDLE};
use gd_native::LoaderConfig;

/// Execute a closure that returns a `GdStatus`, catching any panics
/// and converting them into `GdStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> GdStatus>(f: F) -> GdStatus {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            GdStatus::ErrorInternal
        }
    }
}

fn fail(err: DelegateError) -> GdStatus {
    let status = GdStatus::from(&err);
    set_last_error(err.to_string());
    status
}

/// Install a stderr log subscriber filtered by the `GD_LOG` environment
/// variable. Calling it again is harmless.
#[no_mangle]
pub extern "C" fn gd_logging_init() -> GdStatus {
    catch_panic(|| {
        logging::init();
        GdStatus::Ok
    })
}

/// Default delegate options: precision loss and quantized models allowed,
/// fast-single-answer preference, no EGL context or display.
#[no_mangle]
pub extern "C" fn gd_delegate_options_default() -> GdDelegateOptions {
    GdDelegateOptions::default()
}

/// Load the native delegate library.
///
/// `path` may be null, in which case `GPU_DELEGATE_LIBRARY` or the platform
/// default name is used. Only the first call in a process loads anything;
/// later calls report the outcome of that first load.
#[no_mangle]
pub unsafe extern "C" fn gd_library_init(path: *const c_char) -> GdStatus {
    catch_panic(|| {
        let config = if path.is_null() {
            LoaderConfig::from_env()
        } else {
            match unsafe { CStr::from_ptr(path) }.to_str() {
                Ok(s) => LoaderConfig::with_path(s),
                Err(e) => {
                    set_last_error(format!("invalid library path: {}", e));
                    return GdStatus::ErrorInvalidArgument;
                }
            }
        };
        match gd_native::init(&config) {
            Ok(_) => GdStatus::Ok,
            Err(e) => fail(e.into()),
        }
    })
}

/// Create a GPU delegate.
///
/// `options` may be null for defaults. On success, writes a heap-allocated
/// `GdDelegate` pointer into `*out` and returns `GdStatus::Ok`. The caller
/// must later call `gd_delegate_destroy` to free it.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_create(
    options: *const GdDelegateOptions,
    out: *mut *mut GdDelegate,
) -> GdStatus {
    catch_panic(|| unsafe { create_with(options, out, GpuDelegate::new) })
}

unsafe fn create_with<F>(
    options: *const GdDelegateOptions,
    out: *mut *mut GdDelegate,
    make: F,
) -> GdStatus
where
    F: FnOnce(DelegateOptions) -> gd_delegate::Result<GpuDelegate>,
{
    if out.is_null() {
        set_last_error("out is null".to_string());
        return GdStatus::ErrorInvalidArgument;
    }
    let raw = if options.is_null() {
        GdDelegateOptions::default()
    } else {
        unsafe { *options }
    };
    let options = match DelegateOptions::try_from(raw) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };
    match make(options) {
        Ok(delegate) => {
            unsafe { *out = Box::into_raw(Box::new(GdDelegate::new(delegate))) };
            GdStatus::Ok
        }
        Err(e) => fail(e),
    }
}

/// Native handle to pass to the inference engine, or 0 if `delegate` is null
/// or released.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_native_handle(delegate: *const GdDelegate) -> i64 {
    if delegate.is_null() {
        return INVALID_HANDLE;
    }
    unsafe { &*delegate }.delegate.native_handle()
}

/// Bind an external GPU buffer (e.g. a GL SSBO id) to a tensor index.
///
/// Must be called on the thread with the delegate's graphics context current.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_bind_buffer(
    delegate: *mut GdDelegate,
    tensor_index: i32,
    buffer_id: i32,
) -> GdStatus {
    catch_panic(|| {
        if delegate.is_null() {
            set_last_error("delegate is null".to_string());
            return GdStatus::ErrorInvalidArgument;
        }
        let ctx = unsafe { &mut *delegate };
        match ctx.delegate.bind_buffer_to_index(tensor_index, buffer_id) {
            Ok(()) => GdStatus::Ok,
            Err(e) => fail(e),
        }
    })
}

/// Number of tensor bindings recorded for `delegate`.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_bound_buffer_count(
    delegate: *const GdDelegate,
    out: *mut usize,
) -> GdStatus {
    if delegate.is_null() || out.is_null() {
        set_last_error("null argument".to_string());
        return GdStatus::ErrorInvalidArgument;
    }
    let ctx = unsafe { &*delegate };
    unsafe { *out = ctx.delegate.bound_buffers().len() };
    GdStatus::Ok
}

/// Look up the buffer id bound to `tensor_index`.
///
/// Returns `GdStatus::ErrorNotBound` if nothing is bound there.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_bound_buffer(
    delegate: *const GdDelegate,
    tensor_index: i32,
    out: *mut i32,
) -> GdStatus {
    if delegate.is_null() || out.is_null() {
        set_last_error("null argument".to_string());
        return GdStatus::ErrorInvalidArgument;
    }
    let ctx = unsafe { &*delegate };
    match ctx.delegate.bound_buffers().get(&tensor_index) {
        Some(&buffer_id) => {
            unsafe { *out = buffer_id };
            GdStatus::Ok
        }
        None => {
            set_last_error(format!("no buffer bound to tensor {}", tensor_index));
            GdStatus::ErrorNotBound
        }
    }
}

/// Free the native delegate while keeping the `GdDelegate` object alive.
///
/// Releasing twice is a no-op.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_release(delegate: *mut GdDelegate) -> GdStatus {
    catch_panic(|| {
        if delegate.is_null() {
            set_last_error("delegate is null".to_string());
            return GdStatus::ErrorInvalidArgument;
        }
        unsafe { &mut *delegate }.delegate.release();
        GdStatus::Ok
    })
}

/// Release (if needed) and free a delegate created by `gd_delegate_create`.
///
/// Passing a null pointer is a no-op and returns `GdStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn gd_delegate_destroy(delegate: *mut GdDelegate) -> GdStatus {
    if delegate.is_null() {
        return GdStatus::Ok;
    }
    catch_panic(|| {
        drop(unsafe { Box::from_raw(delegate) });
        GdStatus::Ok
    })
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error on this
/// thread, or null if there is none. The caller must free the returned string
/// with `gd_free_string`.
#[no_mangle]
pub extern "C" fn gd_last_error() -> *mut c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by `gd_last_error`.
#[no_mangle]
pub unsafe extern "C" fn gd_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_delegate::testing::{NativeCall, RecordingApi};
    use std::ptr;
    use std::sync::Arc;

    fn last_error() -> String {
        let raw = gd_last_error();
        assert!(!raw.is_null());
        let msg = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        unsafe { gd_free_string(raw) };
        msg
    }

    fn create(api: &Arc<RecordingApi>, options: *const GdDelegateOptions) -> *mut GdDelegate {
        let mut out = ptr::null_mut();
        let api = api.clone();
        let status = unsafe { create_with(options, &mut out, |o| GpuDelegate::with_api(api, o)) };
        assert_eq!(status, GdStatus::Ok);
        assert!(!out.is_null());
        out
    }

    #[test]
    fn test_default_options_match_delegate_defaults() {
        let opts = gd_delegate_options_default();
        assert!(opts.precision_loss_allowed);
        assert!(opts.quantized_models_allowed);
        assert_eq!(opts.inference_preference, 0);
        assert_eq!(opts.egl_context, 0);
        assert_eq!(opts.egl_display, 0);
    }

    #[test]
    fn test_create_bind_release_destroy() {
        let api = Arc::new(RecordingApi::new());
        let d = create(&api, ptr::null());
        let handle = unsafe { gd_delegate_native_handle(d) };
        assert_ne!(handle, INVALID_HANDLE);

        assert_eq!(unsafe { gd_delegate_bind_buffer(d, 5, 42) }, GdStatus::Ok);
        let mut count = 0usize;
        assert_eq!(unsafe { gd_delegate_bound_buffer_count(d, &mut count) }, GdStatus::Ok);
        assert_eq!(count, 1);
        let mut buffer = 0i32;
        assert_eq!(unsafe { gd_delegate_bound_buffer(d, 5, &mut buffer) }, GdStatus::Ok);
        assert_eq!(buffer, 42);

        assert_eq!(unsafe { gd_delegate_release(d) }, GdStatus::Ok);
        assert_eq!(unsafe { gd_delegate_release(d) }, GdStatus::Ok);
        assert_eq!(unsafe { gd_delegate_native_handle(d) }, INVALID_HANDLE);

        assert_eq!(unsafe { gd_delegate_destroy(d) }, GdStatus::Ok);
        assert_eq!(api.deleted(), vec![handle]);
    }

    #[test]
    fn test_options_forwarded() {
        let api = Arc::new(RecordingApi::new());
        let opts = GdDelegateOptions {
            precision_loss_allowed: false,
            quantized_models_allowed: true,
            inference_preference: 1,
            egl_context: 3,
            egl_display: 4,
        };
        let d = create(&api, &opts);
        assert_eq!(
            api.calls()[0],
            NativeCall::Create {
                precision_loss_allowed: false,
                quantized_models_allowed: true,
                inference_preference: 1,
                egl_display: 4,
                egl_context: 3,
            }
        );
        unsafe { gd_delegate_destroy(d) };
    }

    #[test]
    fn test_destroy_releases_unreleased() {
        let api = Arc::new(RecordingApi::new());
        let d = create(&api, ptr::null());
        let handle = unsafe { gd_delegate_native_handle(d) };
        unsafe { gd_delegate_destroy(d) };
        assert_eq!(api.deleted(), vec![handle]);
    }

    #[test]
    fn test_invalid_preference_rejected() {
        let api = Arc::new(RecordingApi::new());
        let opts = GdDelegateOptions {
            inference_preference: 9,
            ..GdDelegateOptions::default()
        };
        let mut out = ptr::null_mut();
        let status = unsafe {
            create_with(&opts, &mut out, |o| GpuDelegate::with_api(api.clone(), o))
        };
        assert_eq!(status, GdStatus::ErrorInvalidArgument);
        assert!(out.is_null());
        assert!(api.calls().is_empty());
        assert!(last_error().contains('9'));
    }

    #[test]
    fn test_creation_failure_status() {
        let api = Arc::new(RecordingApi::failing());
        let mut out = ptr::null_mut();
        let status = unsafe {
            create_with(ptr::null(), &mut out, |o| GpuDelegate::with_api(api.clone(), o))
        };
        assert_eq!(status, GdStatus::ErrorCreation);
        assert!(out.is_null());
        assert!(!last_error().is_empty());
    }

    #[test]
    fn test_bind_after_release() {
        let api = Arc::new(RecordingApi::new());
        let d = create(&api, ptr::null());
        unsafe { gd_delegate_release(d) };
        assert_eq!(
            unsafe { gd_delegate_bind_buffer(d, 0, 1) },
            GdStatus::ErrorInvalidHandle
        );
        unsafe { gd_delegate_destroy(d) };
    }

    #[test]
    fn test_unbound_lookup() {
        let api = Arc::new(RecordingApi::new());
        let d = create(&api, ptr::null());
        let mut buffer = -1i32;
        assert_eq!(
            unsafe { gd_delegate_bound_buffer(d, 7, &mut buffer) },
            GdStatus::ErrorNotBound
        );
        assert_eq!(buffer, -1);
        unsafe { gd_delegate_destroy(d) };
    }

    #[test]
    fn test_null_arguments() {
        assert_eq!(
            unsafe { gd_delegate_create(ptr::null(), ptr::null_mut()) },
            GdStatus::ErrorInvalidArgument
        );
        assert_eq!(
            unsafe { gd_delegate_bind_buffer(ptr::null_mut(), 0, 0) },
            GdStatus::ErrorInvalidArgument
        );
        assert_eq!(
            unsafe { gd_delegate_release(ptr::null_mut()) },
            GdStatus::ErrorInvalidArgument
        );
        assert_eq!(unsafe { gd_delegate_native_handle(ptr::null()) }, INVALID_HANDLE);
        assert_eq!(unsafe { gd_delegate_destroy(ptr::null_mut()) }, GdStatus::Ok);
    }

    #[test]
    fn test_last_error_cleared_after_take() {
        set_last_error("boom".to_string());
        assert_eq!(last_error(), "boom");
        assert!(gd_last_error().is_null());
    }
}
