use std::collections::HashMap;
use std::fmt;

use crate::delegate::{Delegate, GpuDelegate};
use crate::error::{DelegateError, Result};

/// Builds a delegate with its own fixed configuration.
pub type DelegateFactory = Box<dyn Fn() -> Result<Box<dyn Delegate>>>;

/// Name -> factory table an embedding framework uses to instantiate
/// delegates it only knows by string key.
#[derive(Default)]
pub struct DelegateRegistry {
    factories: HashMap<String, DelegateFactory>,
}

impl DelegateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `"gpu"` mapped to a default-configured [`GpuDelegate`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("gpu", || {
            Ok(Box::new(GpuDelegate::with_defaults()?) as Box<dyn Delegate>)
        });
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn Delegate>> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Delegate>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DelegateError::UnknownDelegate(name.to_string()))?;
        factory()
    }
}

impl fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{DelegateOptions, InferencePreference};
    use crate::testing::{NativeCall, RecordingApi};
    use gd_native::INVALID_HANDLE;
    use std::sync::Arc;

    #[test]
    fn test_builtin_has_gpu() {
        let registry = DelegateRegistry::with_builtin();
        assert!(registry.contains("gpu"));
        assert_eq!(registry.names(), vec!["gpu"]);
    }

    #[test]
    fn test_unknown_name() {
        let registry = DelegateRegistry::new();
        assert!(matches!(
            registry.create("nnapi"),
            Err(DelegateError::UnknownDelegate(ref n)) if n == "nnapi"
        ));
    }

    #[test]
    fn test_registered_factory_creates_delegate() {
        let api = Arc::new(RecordingApi::new());
        let mut registry = DelegateRegistry::new();
        let factory_api = api.clone();
        registry.register("gpu-sustained", move || {
            let options = DelegateOptions::default()
                .with_inference_preference(InferencePreference::SustainedSpeed);
            let delegate = GpuDelegate::with_api(factory_api.clone(), options)?;
            Ok(Box::new(delegate) as Box<dyn Delegate>)
        });

        let delegate = registry.create("gpu-sustained").unwrap();
        assert_eq!(delegate.name(), "gpu");
        assert_ne!(delegate.native_handle(), INVALID_HANDLE);
        assert!(matches!(
            api.calls()[0],
            NativeCall::Create {
                inference_preference: 1,
                ..
            }
        ));

        let handle = delegate.native_handle();
        drop(delegate);
        assert_eq!(api.deleted(), vec![handle]);
    }

    #[test]
    fn test_factory_error_propagates() {
        let api = Arc::new(RecordingApi::failing());
        let mut registry = DelegateRegistry::new();
        registry.register("gpu", move || {
            Ok(Box::new(GpuDelegate::with_api(api.clone(), DelegateOptions::default())?)
                as Box<dyn Delegate>)
        });
        assert!(matches!(
            registry.create("gpu"),
            Err(DelegateError::CreationFailed)
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = DelegateRegistry::new();
        registry.register("x", || Err(DelegateError::CreationFailed));
        registry.register("x", || Err(DelegateError::InvalidHandle));
        assert_eq!(registry.names(), vec!["x"]);
        assert!(matches!(registry.create("x"), Err(DelegateError::InvalidHandle)));
    }
}
