use std::ops::RangeInclusive;

/// Capabilities reported by the backend for a window/device pair.
///
/// Queried once when the surface is created. Call
/// [`Surface::requery_info`](super::Surface::requery_info) to refresh it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Format the backend prefers for presentation.
    pub preferred_format: wgpu::TextureFormat,

    /// Union of all usages surface images support.
    pub supported_usage: wgpu::TextureUsages,

    /// Supported formats, in backend preference order.
    pub formats: Vec<wgpu::TextureFormat>,

    /// Buffering depths the backend can honor.
    pub image_count: RangeInclusive<u32>,

    /// Largest width or height a surface image may have.
    pub max_extent: u32,
}

impl SurfaceInfo {
    /// Returns `true` if `format` can be used for surface images.
    pub fn supports_format(&self, format: wgpu::TextureFormat) -> bool {
        self.formats.contains(&format)
    }

    /// Returns `true` if every flag in `usage` is supported.
    pub fn supports_usage(&self, usage: wgpu::TextureUsages) -> bool {
        self.supported_usage.contains(usage)
    }

    /// Clamps a requested buffering depth into the supported range.
    ///
    /// Requires a non-empty range; see [`SurfaceInfo::check`].
    pub fn clamp_image_count(&self, desired: u32) -> u32 {
        desired.clamp(*self.image_count.start(), *self.image_count.end())
    }

    /// Rejects capability sets a surface cannot be configured from.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.formats.is_empty() {
            return Err("backend reports no presentable formats".to_string());
        }

        if !self.supports_format(self.preferred_format) {
            return Err(format!(
                "preferred format {:?} is not among the supported formats",
                self.preferred_format
            ));
        }

        if self.image_count.is_empty() || *self.image_count.start() == 0 {
            return Err(format!("invalid image count range {:?}", self.image_count));
        }

        Ok(())
    }
}
