use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::error::Result;
use crate::library::NativeLibrary;

/// Environment variable that overrides the library location.
pub const LIBRARY_ENV: &str = "GPU_DELEGATE_LIBRARY";

/// Undecorated library name; the platform prefix/suffix is added on lookup.
pub const DEFAULT_LIBRARY_NAME: &str = "tensorflowlite_gpu_delegate";

/// Where to find the native delegate library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub path: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(libloading::library_filename(DEFAULT_LIBRARY_NAME)),
        }
    }
}

impl LoaderConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location, unless `GPU_DELEGATE_LIBRARY` is set and non-empty.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(LIBRARY_ENV))
    }

    fn from_env_value(value: Option<OsString>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::with_path(v),
            _ => Self::default(),
        }
    }
}

struct Loaded {
    requested: PathBuf,
    outcome: Result<Arc<NativeLibrary>>,
}

static LIBRARY: OnceLock<Loaded> = OnceLock::new();

/// Load the process-wide library using `config`, or return the one already
/// loaded.
///
/// Only the first call performs a load. Its outcome, including a failure, is
/// kept for the life of the process; there is no unload.
pub fn init(config: &LoaderConfig) -> Result<Arc<NativeLibrary>> {
    let loaded = LIBRARY.get_or_init(|| Loaded {
        requested: config.path.clone(),
        outcome: NativeLibrary::load(&config.path).map(Arc::new),
    });
    if loaded.requested != config.path {
        warn!(
            loaded = %loaded.requested.display(),
            requested = %config.path.display(),
            "native delegate library already initialized from a different path"
        );
    }
    loaded.outcome.clone()
}

/// The process-wide library, loading it from [`LoaderConfig::from_env`] on
/// first use.
pub fn global() -> Result<Arc<NativeLibrary>> {
    match LIBRARY.get() {
        Some(loaded) => loaded.outcome.clone(),
        None => init(&LoaderConfig::from_env()),
    }
}

/// Path the process-wide library was (or failed to be) loaded from, if
/// initialization has happened.
pub fn initialized_path() -> Option<&'static Path> {
    LIBRARY.get().map(|l| l.requested.as_path())
}
