use std::rc::Rc;
use std::sync::Arc;

use crate::device::{Device, SurfaceBackend};

use super::image::ImageCache;
use super::{SurfaceConfig, SurfaceError, SurfaceImage, SurfaceInfo};

type NativeImage<D> = <<D as Device>::Backend as SurfaceBackend>::Image;

/// State that only exists while the surface is configured.
struct Configured<I> {
    config: SurfaceConfig,
    epoch: u64,
    cache: ImageCache<I>,
    /// Slot index acquired but not yet presented.
    in_flight: Option<u32>,
}

/// Presentable target bound to a window.
///
/// Lifecycle: `new → [configure → (acquire_next_image → present)* → unconfigure]*`.
///
/// The surface is meant to be driven from the render loop's thread; it does
/// no internal synchronization.
pub struct Surface<D: Device> {
    device: Arc<D>,
    backend: D::Backend,
    info: SurfaceInfo,
    state: Option<Configured<NativeImage<D>>>,
    /// Last epoch handed out. Epochs start at 1.
    epoch: u64,
}

impl<D: Device> Surface<D> {
    /// Binds a surface to `window` through `device` and queries capabilities.
    pub fn new(device: Arc<D>, window: D::Window) -> Result<Self, SurfaceError> {
        let backend = device.create_surface_backend(window)?;
        let info = backend.query_info();
        info.check().map_err(SurfaceError::Init)?;

        log::debug!(
            "surface created: preferred {:?}, {} formats, usage {:?}, images {:?}",
            info.preferred_format,
            info.formats.len(),
            info.supported_usage,
            info.image_count
        );

        Ok(Self {
            device,
            backend,
            info,
            state: None,
            epoch: 0,
        })
    }

    /// Returns the capabilities queried from the backend.
    pub fn info(&self) -> &SurfaceInfo {
        &self.info
    }

    /// Re-queries capabilities from the backend.
    ///
    /// The active configuration is left as is; it is checked against the new
    /// capabilities on the next `configure`. Unusable capabilities are
    /// rejected with [`SurfaceError::Init`] and the previous info is kept.
    pub fn requery_info(&mut self) -> Result<&SurfaceInfo, SurfaceError> {
        let info = self.backend.query_info();
        info.check().map_err(SurfaceError::Init)?;

        if info != self.info {
            log::debug!("surface capabilities changed: {:?}", info);
        }
        self.info = info;
        Ok(&self.info)
    }

    /// Returns the active configuration, or `None` while unconfigured.
    pub fn config(&self) -> Option<&SurfaceConfig> {
        self.state.as_ref().map(|s| &s.config)
    }

    /// Returns `true` while configured.
    pub fn is_configured(&self) -> bool {
        self.state.is_some()
    }

    /// Builds a configuration for `width × height` using the preferred format
    /// and render-attachment usage.
    pub fn default_config(&self, width: u32, height: u32) -> SurfaceConfig {
        SurfaceConfig::new(
            self.info.preferred_format,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            width,
            height,
        )
    }

    /// Returns the device this surface presents through.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Returns the backend presentation object.
    pub fn backend(&self) -> &D::Backend {
        &self.backend
    }

    /// Current configuration epoch, or `None` while unconfigured.
    pub fn epoch(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.epoch)
    }

    /// Number of images the backend allocated for the active configuration.
    pub fn image_count(&self) -> Option<u32> {
        self.state.as_ref().map(|s| s.cache.capacity() as u32)
    }

    /// Number of image wrappers cached for the current epoch.
    pub fn cached_image_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.cache.len())
    }

    /// Slot index of the image currently in flight.
    pub fn in_flight(&self) -> Option<u32> {
        self.state.as_ref().and_then(|s| s.in_flight)
    }

    /// Returns `true` if `image` belongs to the active configuration epoch.
    pub fn is_current(&self, image: &SurfaceImage<NativeImage<D>>) -> bool {
        self.epoch() == Some(image.epoch())
    }

    /// Configures (or reconfigures) the surface.
    ///
    /// Format, usage and extent must fit [`Surface::info`]; the image count is
    /// clamped. Starts a new epoch: previously acquired images are stale and
    /// an image in flight is discarded without being presented.
    ///
    /// On an invalid configuration the current state is kept. If the backend
    /// fails after validation, the surface is left unconfigured.
    pub fn configure(&mut self, config: SurfaceConfig) -> Result<(), SurfaceError> {
        let config = config.resolve(&self.info)?;

        if let Some(prev) = self.state.take() {
            if prev.in_flight.is_some() {
                log::debug!("discarding in-flight image of epoch {}", prev.epoch);
                self.backend.discard();
            }
        }

        let image_count = match self.backend.configure(&config) {
            Ok(0) => {
                log::warn!("surface configure produced an empty swapchain");
                self.backend.unconfigure();
                return Err(SurfaceError::Backend(
                    "backend allocated no swapchain images".to_string(),
                ));
            }
            Ok(count) => count,
            Err(err) => {
                log::warn!("surface configure failed: {err}");
                self.backend.unconfigure();
                return Err(err.into());
            }
        };

        self.epoch += 1;
        log::debug!(
            "surface configured: {}x{} {:?}, {} images, vsync {}, epoch {}",
            config.width,
            config.height,
            config.format,
            image_count,
            config.vsync,
            self.epoch
        );

        self.state = Some(Configured {
            config,
            epoch: self.epoch,
            cache: ImageCache::new(image_count),
            in_flight: None,
        });

        Ok(())
    }

    /// Releases the presentation resource. No-op when already unconfigured.
    pub fn unconfigure(&mut self) {
        let Some(prev) = self.state.take() else {
            return;
        };

        if prev.in_flight.is_some() {
            self.backend.discard();
        }
        self.backend.unconfigure();

        log::debug!("surface unconfigured (epoch {})", prev.epoch);
    }

    /// Acquires the next image for rendering.
    ///
    /// Only one image may be in flight; call [`Surface::present`] before
    /// acquiring again. May block until the backend frees an image.
    pub fn acquire_next_image(
        &mut self,
    ) -> Result<Rc<SurfaceImage<NativeImage<D>>>, SurfaceError> {
        let state = self.state.as_mut().ok_or(SurfaceError::NotConfigured)?;
        if state.in_flight.is_some() {
            return Err(SurfaceError::AcquireInProgress);
        }

        let index = self.backend.acquire_next_image().map_err(|err| {
            log::warn!("surface image acquisition failed: {err}");
            SurfaceError::from(err)
        })?;

        let backend = &self.backend;
        let (epoch, config) = (state.epoch, &state.config);
        let image = state
            .cache
            .get_or_insert_with(index, || {
                SurfaceImage::new(index, epoch, config, backend.image(index))
            });

        let Some(image) = image else {
            self.backend.discard();
            return Err(SurfaceError::Backend(format!(
                "backend returned image index {index} outside swapchain of {}",
                state.cache.capacity()
            )));
        };

        state.in_flight = Some(index);
        log::trace!("acquired surface image {index} (epoch {epoch})");

        Ok(image)
    }

    /// Presents the image returned by the last acquisition.
    ///
    /// The in-flight marker is cleared even if the backend fails, so the
    /// caller can recover by reconfiguring.
    pub fn present(&mut self) -> Result<(), SurfaceError> {
        let index = self
            .state
            .as_mut()
            .and_then(|s| s.in_flight.take())
            .ok_or(SurfaceError::NothingToPresent)?;

        self.backend.present().map_err(|err| {
            log::warn!("surface present failed: {err}");
            SurfaceError::from(err)
        })?;

        log::trace!("presented surface image {index}");
        Ok(())
    }
}

impl<D: Device> Drop for Surface<D> {
    fn drop(&mut self) {
        self.unconfigure();
    }
}
