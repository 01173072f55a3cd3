use super::error::ConfigError;
use super::info::SurfaceInfo;

/// Application-supplied surface configuration.
///
/// Format, usage and extent are validated strictly against [`SurfaceInfo`].
/// `desired_image_count` is a hint and is clamped to the supported range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// Surface image format.
    pub format: wgpu::TextureFormat,

    /// Surface image usage.
    pub usage: wgpu::TextureUsages,

    /// Surface image width in physical pixels.
    pub width: u32,

    /// Surface image height in physical pixels.
    pub height: u32,

    /// Desired number of images in the swapchain.
    pub desired_image_count: u32,

    /// Enable/disable vertical synchronization.
    pub vsync: bool,
}

impl SurfaceConfig {
    /// Default buffering depth.
    pub const DEFAULT_IMAGE_COUNT: u32 = 3;

    /// Creates a configuration with the given format/usage/size, triple
    /// buffering and vsync enabled.
    pub fn new(
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            format,
            usage,
            width,
            height,
            desired_image_count: Self::DEFAULT_IMAGE_COUNT,
            vsync: true,
        }
    }

    /// Returns a copy with a different buffering depth hint.
    pub fn with_image_count(mut self, count: u32) -> Self {
        self.desired_image_count = count;
        self
    }

    /// Returns a copy with vsync enabled or disabled.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Checks this configuration against the surface capabilities.
    pub fn validate(&self, info: &SurfaceInfo) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroExtent {
                width: self.width,
                height: self.height,
            });
        }

        if self.width > info.max_extent || self.height > info.max_extent {
            return Err(ConfigError::ExtentTooLarge {
                width: self.width,
                height: self.height,
                max: info.max_extent,
            });
        }

        if !info.supports_format(self.format) {
            return Err(ConfigError::UnsupportedFormat(self.format));
        }

        if !info.supports_usage(self.usage) {
            return Err(ConfigError::UnsupportedUsage {
                requested: self.usage,
                supported: info.supported_usage,
            });
        }

        Ok(())
    }

    /// Validates and returns the configuration that will actually be applied.
    ///
    /// Only `desired_image_count` may differ from `self`.
    pub(crate) fn resolve(&self, info: &SurfaceInfo) -> Result<SurfaceConfig, ConfigError> {
        self.validate(info)?;

        let count = info.clamp_image_count(self.desired_image_count);
        if count != self.desired_image_count {
            log::debug!(
                "surface image count {} clamped to {} (supported {:?})",
                self.desired_image_count,
                count,
                info.image_count
            );
        }

        Ok(self.clone().with_image_count(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{TextureFormat, TextureUsages};

    fn info() -> SurfaceInfo {
        SurfaceInfo {
            preferred_format: TextureFormat::Bgra8UnormSrgb,
            supported_usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_DST,
            formats: vec![TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm],
            image_count: 2..=3,
            max_extent: 4096,
        }
    }

    fn valid() -> SurfaceConfig {
        SurfaceConfig::new(
            TextureFormat::Bgra8UnormSrgb,
            TextureUsages::RENDER_ATTACHMENT,
            800,
            600,
        )
    }

    // ── validate ──────────────────────────────────────────────────────────

    #[test]
    fn defaults_are_triple_buffered_with_vsync() {
        let c = valid();
        assert_eq!(c.desired_image_count, 3);
        assert!(c.vsync);
    }

    #[test]
    fn accepts_supported_config() {
        assert_eq!(valid().validate(&info()), Ok(()));
    }

    #[test]
    fn rejects_zero_width_and_height() {
        let mut c = valid();
        c.width = 0;
        assert!(matches!(c.validate(&info()), Err(ConfigError::ZeroExtent { .. })));

        let mut c = valid();
        c.height = 0;
        assert!(matches!(c.validate(&info()), Err(ConfigError::ZeroExtent { .. })));
    }

    #[test]
    fn rejects_oversized_extent() {
        let mut c = valid();
        c.width = 4097;
        assert_eq!(
            c.validate(&info()),
            Err(ConfigError::ExtentTooLarge { width: 4097, height: 600, max: 4096 })
        );
    }

    #[test]
    fn rejects_unsupported_format() {
        let mut c = valid();
        c.format = TextureFormat::Rgba16Float;
        assert_eq!(
            c.validate(&info()),
            Err(ConfigError::UnsupportedFormat(TextureFormat::Rgba16Float))
        );
    }

    #[test]
    fn rejects_usage_outside_supported_set() {
        let mut c = valid();
        c.usage = TextureUsages::RENDER_ATTACHMENT | TextureUsages::STORAGE_BINDING;
        assert!(matches!(
            c.validate(&info()),
            Err(ConfigError::UnsupportedUsage { .. })
        ));
    }

    // ── resolve ───────────────────────────────────────────────────────────

    #[test]
    fn resolve_clamps_only_image_count() {
        let c = valid().with_image_count(8).with_vsync(false);
        let resolved = c.resolve(&info()).unwrap();
        assert_eq!(resolved.desired_image_count, 3);
        assert_eq!(resolved.format, c.format);
        assert_eq!(resolved.usage, c.usage);
        assert_eq!((resolved.width, resolved.height), (800, 600));
        assert!(!resolved.vsync);
    }

    #[test]
    fn resolve_reports_invalid_config_instead_of_clamping() {
        let mut c = valid();
        c.width = 0;
        assert!(c.resolve(&info()).is_err());
    }
}
