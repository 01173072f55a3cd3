use std::rc::Rc;

/// A presentable image handed out by [`Surface::acquire_next_image`].
///
/// Wraps one backend image slot for one configuration epoch. The handle stays
/// readable after presentation, but must not be rendered to again until it is
/// returned by a later acquisition.
///
/// [`Surface::acquire_next_image`]: super::Surface::acquire_next_image
#[derive(Debug)]
pub struct SurfaceImage<I> {
    index: u32,
    epoch: u64,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    native: I,
}

impl<I> SurfaceImage<I> {
    pub(crate) fn new(
        index: u32,
        epoch: u64,
        config: &super::SurfaceConfig,
        native: I,
    ) -> Self {
        Self {
            index,
            epoch,
            width: config.width,
            height: config.height,
            format: config.format,
            usage: config.usage,
            native,
        }
    }

    /// Slot index within the swapchain.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Configuration epoch this image belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn usage(&self) -> wgpu::TextureUsages {
        self.usage
    }

    /// Backend-native image behind this handle.
    pub fn native(&self) -> &I {
        &self.native
    }
}

/// Per-epoch cache of image wrappers, one slot per swapchain image.
#[derive(Debug)]
pub(crate) struct ImageCache<I> {
    slots: Vec<Option<Rc<SurfaceImage<I>>>>,
}

impl<I> ImageCache<I> {
    /// Creates an empty cache for a swapchain with `image_count` images.
    pub(crate) fn new(image_count: u32) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(image_count as usize, || None);
        Self { slots }
    }

    /// Number of slots (the backend's actual image count).
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of wrappers materialized so far.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns the wrapper for `index`, constructing it on first use.
    ///
    /// Returns `None` if `index` is outside the swapchain.
    pub(crate) fn get_or_insert_with(
        &mut self,
        index: u32,
        make: impl FnOnce() -> SurfaceImage<I>,
    ) -> Option<Rc<SurfaceImage<I>>> {
        let slot = self.slots.get_mut(index as usize)?;
        let image = slot.get_or_insert_with(|| Rc::new(make()));
        Some(Rc::clone(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceConfig;

    fn config() -> SurfaceConfig {
        SurfaceConfig::new(
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            64,
            32,
        )
    }

    #[test]
    fn repeat_index_returns_same_wrapper() {
        let cfg = config();
        let mut cache = ImageCache::new(3);
        let a = cache.get_or_insert_with(1, || SurfaceImage::new(1, 0, &cfg, ())).unwrap();
        let b = cache
            .get_or_insert_with(1, || panic!("wrapper rebuilt for cached slot"))
            .unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let cfg = config();
        let mut cache = ImageCache::new(2);
        assert!(cache.get_or_insert_with(2, || SurfaceImage::new(2, 0, &cfg, ())).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn wrapper_copies_config_metadata() {
        let cfg = config();
        let image = SurfaceImage::new(0, 7, &cfg, "native");
        assert_eq!((image.width(), image.height()), (64, 32));
        assert_eq!(image.format(), wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(image.epoch(), 7);
        assert_eq!(*image.native(), "native");
    }

    #[test]
    fn never_exceeds_capacity() {
        let cfg = config();
        let mut cache = ImageCache::new(3);
        for i in 0..30 {
            let index = i % 3;
            cache.get_or_insert_with(index, || SurfaceImage::new(index, 0, &cfg, ()));
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.capacity(), 3);
    }
}
