use gd_delegate::GpuDelegate;

/// Opaque handle that owns one `GpuDelegate`.
///
/// Must be used only on the thread that created it.
pub struct GdDelegate {
    pub delegate: GpuDelegate,
}

impl GdDelegate {
    pub fn new(delegate: GpuDelegate) -> Self {
        Self { delegate }
    }
}
