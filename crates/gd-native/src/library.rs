use std::fmt;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tracing::{debug, info};

use crate::api::{NativeDelegateApi, RawHandle};
use crate::error::{NativeError, Result};

pub const SYM_CREATE: &str = "gpu_delegate_create";
pub const SYM_DELETE: &str = "gpu_delegate_delete";
pub const SYM_BIND_BUFFER: &str = "gpu_delegate_bind_buffer_to_tensor";

type FnCreate = unsafe extern "C" fn(
    precision_loss_allowed: bool,
    quantized_models_allowed: bool,
    inference_preference: c_int,
    egl_display: i64,
    egl_context: i64,
) -> RawHandle;
type FnDelete = unsafe extern "C" fn(handle: RawHandle);
type FnBindBuffer = unsafe extern "C" fn(handle: RawHandle, tensor_index: c_int, buffer_id: c_int);

/// A loaded native delegate library with its entry points resolved.
///
/// The function pointers are only valid while `_lib` is alive, so they are
/// kept together and never handed out.
pub struct NativeLibrary {
    path: PathBuf,
    create: FnCreate,
    delete: FnDelete,
    bind_buffer: FnBindBuffer,
    _lib: Library,
}

impl NativeLibrary {
    /// Load the shared library at `path` and resolve all three entry points.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading runs the library's initializers. The caller chose
        // the path; we trust it to be the delegate library.
        let lib = unsafe { Library::new(&path) }.map_err(|e| NativeError::LibraryLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        // Safety: the typedefs above mirror the exported C signatures.
        let library = unsafe {
            Self {
                create: load_fn(&lib, SYM_CREATE)?,
                delete: load_fn(&lib, SYM_DELETE)?,
                bind_buffer: load_fn(&lib, SYM_BIND_BUFFER)?,
                path,
                _lib: lib,
            }
        };

        info!(path = %library.path.display(), "native GPU delegate library loaded");
        Ok(library)
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

unsafe fn load_fn<F: Copy>(lib: &Library, name: &'static str) -> Result<F> {
    let sym: Symbol<F> = lib
        .get(name.as_bytes())
        .map_err(|e| NativeError::SymbolNotFound {
            symbol: name,
            reason: e.to_string(),
        })?;
    debug!(symbol = name, "resolved native symbol");
    Ok(*sym)
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl NativeDelegateApi for NativeLibrary {
    fn create_delegate(
        &self,
        precision_loss_allowed: bool,
        quantized_models_allowed: bool,
        inference_preference: i32,
        egl_display: i64,
        egl_context: i64,
    ) -> RawHandle {
        unsafe {
            (self.create)(
                precision_loss_allowed,
                quantized_models_allowed,
                inference_preference as c_int,
                egl_display,
                egl_context,
            )
        }
    }

    fn delete_delegate(&self, handle: RawHandle) {
        unsafe { (self.delete)(handle) }
    }

    fn bind_buffer_to_tensor(&self, handle: RawHandle, tensor_index: i32, buffer_id: i32) {
        unsafe { (self.bind_buffer)(handle, tensor_index as c_int, buffer_id as c_int) }
    }
}
