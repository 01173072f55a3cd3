use winit::dpi::LogicalSize;

/// Viewer configuration.
///
/// Defaults can be overridden through `VISTA_VSYNC` (`0`/`false` disables
/// vsync) and `VISTA_IMAGE_COUNT`.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub vsync: bool,
    pub desired_image_count: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "vista viewer".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            vsync: true,
            desired_image_count: 3,
        }
    }
}

impl ViewerConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var("VISTA_VSYNC").ok().as_deref(),
            std::env::var("VISTA_IMAGE_COUNT").ok().as_deref(),
        )
    }

    fn with_overrides(mut self, vsync: Option<&str>, image_count: Option<&str>) -> Self {
        if let Some(v) = vsync {
            match v.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.vsync = false,
                "1" | "true" | "on" => self.vsync = true,
                other => log::warn!("ignoring VISTA_VSYNC={other:?}"),
            }
        }

        if let Some(n) = image_count {
            match n.trim().parse() {
                Ok(n) => self.desired_image_count = n,
                Err(e) => log::warn!("ignoring VISTA_IMAGE_COUNT={n:?}: {e}"),
            }
        }

        self
    }
}
