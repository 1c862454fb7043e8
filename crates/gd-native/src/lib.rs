//! `gd-native` - Raw boundary to the native GPU delegate library.
//!
//! This crate provides:
//! - The `NativeDelegateApi` trait: create, delete and bind-buffer calls
//! - `NativeLibrary`, which resolves those calls from a shared object at runtime
//! - Process-wide, load-once access to the library (`init` / `global`)

pub mod api;
pub mod error;
pub mod library;
pub mod loader;

pub use api::{NativeDelegateApi, RawHandle, INVALID_HANDLE};
pub use error::{NativeError, Result};
pub use library::NativeLibrary;
pub use loader::{global, init, initialized_path, LoaderConfig, DEFAULT_LIBRARY_NAME, LIBRARY_ENV};
