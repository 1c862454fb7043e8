use gd_delegate::{DelegateError, DelegateOptions, InferencePreference};

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GdStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorLibraryLoad = 2,
    ErrorCreation = 3,
    ErrorInvalidHandle = 4,
    ErrorNotBound = 5,
    ErrorInternal = 6,
}

impl From<&DelegateError> for GdStatus {
    fn from(err: &DelegateError) -> Self {
        match err {
            DelegateError::Native(_) => GdStatus::ErrorLibraryLoad,
            DelegateError::CreationFailed => GdStatus::ErrorCreation,
            DelegateError::InvalidHandle => GdStatus::ErrorInvalidHandle,
            DelegateError::InvalidTensorIndex(_)
            | DelegateError::InvalidPreference(_)
            | DelegateError::UnknownDelegate(_) => GdStatus::ErrorInvalidArgument,
        }
    }
}

/// Delegate creation options.
///
/// `inference_preference` is 0 (fast single answer) or 1 (sustained speed).
/// EGL handles are 0 when absent.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GdDelegateOptions {
    pub precision_loss_allowed: bool,
    pub quantized_models_allowed: bool,
    pub inference_preference: i32,
    pub egl_context: i64,
    pub egl_display: i64,
}

impl Default for GdDelegateOptions {
    fn default() -> Self {
        DelegateOptions::default().into()
    }
}

impl From<DelegateOptions> for GdDelegateOptions {
    fn from(opts: DelegateOptions) -> Self {
        Self {
            precision_loss_allowed: opts.precision_loss_allowed,
            quantized_models_allowed: opts.quantized_models_allowed,
            inference_preference: opts.inference_preference.as_raw(),
            egl_context: opts.egl_context,
            egl_display: opts.egl_display,
        }
    }
}

impl TryFrom<GdDelegateOptions> for DelegateOptions {
    type Error = DelegateError;

    fn try_from(raw: GdDelegateOptions) -> Result<Self, DelegateError> {
        Ok(DelegateOptions {
            precision_loss_allowed: raw.precision_loss_allowed,
            quantized_models_allowed: raw.quantized_models_allowed,
            inference_preference: InferencePreference::try_from(raw.inference_preference)?,
            egl_context: raw.egl_context,
            egl_display: raw.egl_display,
        })
    }
}
