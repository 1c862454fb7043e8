use serde::{Deserialize, Serialize};

use crate::error::{DelegateError, Result};

/// Precision/compilation/runtime trade-off requested from the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePreference {
    /// The delegate will be used only once, so bootstrap time counts.
    #[default]
    FastSingleAnswer,
    /// Maximize throughput; the same delegate runs repeatedly on many inputs.
    SustainedSpeed,
}

impl InferencePreference {
    /// Value passed across the native boundary.
    pub fn as_raw(self) -> i32 {
        match self {
            InferencePreference::FastSingleAnswer => 0,
            InferencePreference::SustainedSpeed => 1,
        }
    }
}

impl TryFrom<i32> for InferencePreference {
    type Error = DelegateError;

    fn try_from(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(InferencePreference::FastSingleAnswer),
            1 => Ok(InferencePreference::SustainedSpeed),
            other => Err(DelegateError::InvalidPreference(other)),
        }
    }
}

/// Options fixed at delegate creation.
///
/// Values are forwarded as-is; range checking belongs to the native library.
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateOptions {
    /// When true the GPU may quantize tensors, downcast values and run in
    /// FP16. When false, computation stays in 32-bit float.
    pub precision_loss_allowed: bool,
    /// Allow the delegate to run quantized models.
    pub quantized_models_allowed: bool,
    pub inference_preference: InferencePreference,
    /// Externally owned EGL context, 0 if absent.
    pub egl_context: i64,
    /// Externally owned EGL display, 0 if absent.
    pub egl_display: i64,
}

impl Default for DelegateOptions {
    fn default() -> Self {
        Self {
            precision_loss_allowed: true,
            quantized_models_allowed: true,
            inference_preference: InferencePreference::FastSingleAnswer,
            egl_context: 0,
            egl_display: 0,
        }
    }
}

impl DelegateOptions {
    pub fn with_precision_loss_allowed(mut self, allowed: bool) -> Self {
        self.precision_loss_allowed = allowed;
        self
    }

    pub fn with_quantized_models_allowed(mut self, allowed: bool) -> Self {
        self.quantized_models_allowed = allowed;
        self
    }

    pub fn with_inference_preference(mut self, preference: InferencePreference) -> Self {
        self.inference_preference = preference;
        self
    }

    pub fn with_egl_context(mut self, context: i64) -> Self {
        self.egl_context = context;
        self
    }

    pub fn with_egl_display(mut self, display: i64) -> Self {
        self.egl_display = display;
        self
    }
}
