use thiserror::Error;

#[derive(Error, Debug)]
pub enum DelegateError {
    #[error(transparent)]
    Native(#[from] gd_native::NativeError),
    #[error("native library returned an invalid handle while creating the delegate")]
    CreationFailed,
    #[error("delegate handle is invalid (released or never created)")]
    InvalidHandle,
    #[error("invalid tensor index {0}")]
    InvalidTensorIndex(i32),
    #[error("unknown inference preference {0}")]
    InvalidPreference(i32),
    #[error("no delegate factory registered under '{0}'")]
    UnknownDelegate(String),
}

pub type Result<T> = std::result::Result<T, DelegateError>;
