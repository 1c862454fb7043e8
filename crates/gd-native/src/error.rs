use std::path::PathBuf;

use thiserror::Error;

/// Failures at the boundary to the native delegate library.
///
/// `Clone` because the process-wide load outcome is cached and handed to
/// every caller of [`crate::global`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    #[error("failed to load native delegate library '{path}': {reason}")]
    LibraryLoad { path: PathBuf, reason: String },
    #[error("symbol '{symbol}' not found in native delegate library: {reason}")]
    SymbolNotFound { symbol: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, NativeError>;
