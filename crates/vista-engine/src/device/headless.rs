//! In-process device that presents into CPU pixel buffers.
//!
//! Useful for tests and for running the surface state machine without a GPU.
//! [`HeadlessWindow`] stands in for a platform window. It can be resized or
//! destroyed out-of-band, moved to a display with different capabilities, or
//! armed with a one-shot [`HeadlessFault`] to exercise error handling.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::surface::{BackendError, SurfaceConfig, SurfaceError, SurfaceInfo};

use super::backend::{Device, SurfaceBackend};

/// Misbehavior a [`HeadlessSurface`] reproduces once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeadlessFault {
    /// The next acquisition times out.
    AcquireTimeout,
    /// The next acquisition returns an index past the end of the swapchain.
    AcquireOutOfRange,
    /// The next configure reports zero allocated images.
    EmptySwapchain,
}

#[derive(Debug)]
struct WindowState {
    width: u32,
    height: u32,
    destroyed: bool,
    fault: Option<HeadlessFault>,
    /// Overrides the device capabilities, e.g. after moving to another display.
    capabilities: Option<SurfaceInfo>,
}

/// Fake platform window shared between the application and the surface.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    state: Rc<RefCell<WindowState>>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(WindowState {
                width,
                height,
                destroyed: false,
                fault: None,
                capabilities: None,
            })),
        }
    }

    /// Current inner size.
    pub fn size(&self) -> (u32, u32) {
        let s = self.state.borrow();
        (s.width, s.height)
    }

    /// Resizes the window behind the surface's back.
    pub fn resize(&self, width: u32, height: u32) {
        let mut s = self.state.borrow_mut();
        s.width = width;
        s.height = height;
    }

    /// Destroys the window. Any surface bound to it is lost.
    pub fn destroy(&self) {
        self.state.borrow_mut().destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Arms a fault for the next matching backend call.
    pub fn inject(&self, fault: HeadlessFault) {
        self.state.borrow_mut().fault = Some(fault);
    }

    /// Reports `info` instead of the device capabilities from now on.
    pub fn set_capabilities(&self, info: SurfaceInfo) {
        self.state.borrow_mut().capabilities = Some(info);
    }

    fn take_fault(&self, fault: HeadlessFault) -> bool {
        let mut s = self.state.borrow_mut();
        if s.fault == Some(fault) {
            s.fault = None;
            return true;
        }
        false
    }

    fn capabilities(&self) -> Option<SurfaceInfo> {
        self.state.borrow().capabilities.clone()
    }
}

/// Device that creates [`HeadlessSurface`] backends.
#[derive(Debug, Clone)]
pub struct HeadlessDevice {
    info: SurfaceInfo,
    can_present: bool,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::with_info(SurfaceInfo {
            preferred_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            supported_usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::TEXTURE_BINDING,
            formats: vec![
                wgpu::TextureFormat::Bgra8UnormSrgb,
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Rgba8UnormSrgb,
                wgpu::TextureFormat::Rgba8Unorm,
            ],
            image_count: 2..=4,
            max_extent: 8192,
        })
    }
}

impl HeadlessDevice {
    /// Creates a device reporting the given capabilities.
    pub fn with_info(info: SurfaceInfo) -> Self {
        Self {
            info,
            can_present: true,
        }
    }

    /// Creates a device that refuses to bind surfaces.
    pub fn without_presentation() -> Self {
        Self {
            can_present: false,
            ..Self::default()
        }
    }
}

impl Device for HeadlessDevice {
    type Window = HeadlessWindow;
    type Backend = HeadlessSurface;

    fn create_surface_backend(&self, window: HeadlessWindow) -> Result<HeadlessSurface, SurfaceError> {
        if !self.can_present {
            return Err(SurfaceError::Init(
                "headless device has presentation disabled".to_string(),
            ));
        }
        if window.is_destroyed() {
            return Err(SurfaceError::Init("window is destroyed".to_string()));
        }

        Ok(HeadlessSurface {
            window,
            info: self.info.clone(),
            swapchain: None,
            stats: Rc::new(Cell::new(HeadlessStats::default())),
        })
    }
}

/// One swapchain image: an RGBA8 pixel buffer.
#[derive(Debug, Clone)]
pub struct HeadlessImage {
    width: u32,
    height: u32,
    pixels: Rc<RefCell<Vec<[u8; 4]>>>,
}

impl HeadlessImage {
    fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: Rc::new(RefCell::new(vec![[0; 4]; len])),
        }
    }

    /// Fills the whole image with one color.
    pub fn fill(&self, rgba: [u8; 4]) {
        self.pixels.borrow_mut().fill(rgba);
    }

    /// Reads one pixel, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.pixels.borrow().get(i).copied()
    }
}

/// Operation counters recorded by [`HeadlessSurface`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HeadlessStats {
    pub configures: u32,
    pub releases: u32,
    pub acquires: u32,
    pub presents: u32,
    pub discards: u32,
}

#[derive(Debug)]
struct Swapchain {
    /// Window extent at configure time; any change means the target is stale.
    window_size: (u32, u32),
    images: Vec<HeadlessImage>,
    next: u32,
    acquired: Option<u32>,
    last_presented: Option<u32>,
}

/// Headless presentation object.
#[derive(Debug)]
pub struct HeadlessSurface {
    window: HeadlessWindow,
    info: SurfaceInfo,
    swapchain: Option<Swapchain>,
    stats: Rc<Cell<HeadlessStats>>,
}

impl HeadlessSurface {
    pub fn is_configured(&self) -> bool {
        self.swapchain.is_some()
    }

    pub fn stats(&self) -> HeadlessStats {
        self.stats.get()
    }

    /// Counters that stay readable after the surface is dropped.
    pub fn shared_stats(&self) -> Rc<Cell<HeadlessStats>> {
        Rc::clone(&self.stats)
    }

    /// Slot index of the most recently presented image.
    pub fn last_presented(&self) -> Option<u32> {
        self.swapchain.as_ref().and_then(|s| s.last_presented)
    }

    fn bump(&self, f: impl FnOnce(&mut HeadlessStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn check_target(&self, swapchain: &Swapchain) -> Result<(), BackendError> {
        if self.window.is_destroyed() || self.window.size() != swapchain.window_size {
            return Err(BackendError::Lost);
        }
        Ok(())
    }
}

impl SurfaceBackend for HeadlessSurface {
    type Image = HeadlessImage;

    fn query_info(&self) -> SurfaceInfo {
        self.window
            .capabilities()
            .unwrap_or_else(|| self.info.clone())
    }

    fn configure(&mut self, config: &SurfaceConfig) -> Result<u32, BackendError> {
        if self.window.is_destroyed() {
            return Err(BackendError::Lost);
        }

        let count = if self.window.take_fault(HeadlessFault::EmptySwapchain) {
            0
        } else {
            config.desired_image_count
        };
        let images = (0..count)
            .map(|_| HeadlessImage::new(config.width, config.height))
            .collect();

        self.swapchain = Some(Swapchain {
            window_size: self.window.size(),
            images,
            next: 0,
            acquired: None,
            last_presented: None,
        });
        self.bump(|s| s.configures += 1);

        Ok(count)
    }

    fn unconfigure(&mut self) {
        if self.swapchain.take().is_some() {
            self.bump(|s| s.releases += 1);
        }
    }

    fn acquire_next_image(&mut self) -> Result<u32, BackendError> {
        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| BackendError::Other("swapchain not configured".to_string()))?;
        self.check_target(swapchain)?;

        if swapchain.images.is_empty() {
            return Err(BackendError::Other("swapchain has no images".to_string()));
        }
        if self.window.take_fault(HeadlessFault::AcquireTimeout) {
            return Err(BackendError::Timeout);
        }
        let out_of_range = self.window.take_fault(HeadlessFault::AcquireOutOfRange);

        let Some(swapchain) = self.swapchain.as_mut() else {
            return Err(BackendError::Other("swapchain not configured".to_string()));
        };
        let len = swapchain.images.len() as u32;
        let index = if out_of_range { len } else { swapchain.next };
        swapchain.next = (swapchain.next + 1) % len;
        swapchain.acquired = Some(index);
        self.bump(|s| s.acquires += 1);

        Ok(index)
    }

    fn image(&self, index: u32) -> HeadlessImage {
        self.swapchain
            .as_ref()
            .and_then(|s| s.images.get(index as usize))
            .cloned()
            .unwrap_or_else(|| HeadlessImage::new(0, 0))
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| BackendError::Other("swapchain not configured".to_string()))?;
        let result = self.check_target(swapchain);

        if let Some(swapchain) = self.swapchain.as_mut() {
            let acquired = swapchain.acquired.take();
            if result.is_ok() {
                swapchain.last_presented = acquired;
            }
        }
        result?;

        self.bump(|s| s.presents += 1);
        Ok(())
    }

    fn discard(&mut self) {
        if let Some(swapchain) = self.swapchain.as_mut() {
            if swapchain.acquired.take().is_some() {
                self.bump(|s| s.discards += 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SurfaceConfig {
        SurfaceConfig::new(
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            4,
            2,
        )
    }

    fn backend(window: &HeadlessWindow) -> HeadlessSurface {
        HeadlessDevice::default()
            .create_surface_backend(window.clone())
            .unwrap()
    }

    #[test]
    fn acquire_rotates_through_slots() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        assert_eq!(b.configure(&config()).unwrap(), 3);

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(b.acquire_next_image().unwrap());
            b.present().unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(b.last_presented(), Some(2));
    }

    #[test]
    fn images_are_shared_pixel_buffers() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        b.configure(&config()).unwrap();

        let index = b.acquire_next_image().unwrap();
        b.image(index).fill([255, 0, 0, 255]);
        assert_eq!(b.image(index).pixel(3, 1), Some([255, 0, 0, 255]));
        assert_eq!(b.image(index).pixel(4, 0), None);
    }

    #[test]
    fn resize_makes_target_lost() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        b.configure(&config()).unwrap();
        window.resize(8, 8);
        assert_eq!(b.acquire_next_image(), Err(BackendError::Lost));
    }

    #[test]
    fn discard_only_counts_acquired_images() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        b.configure(&config()).unwrap();
        b.discard();
        assert_eq!(b.stats().discards, 0);

        b.acquire_next_image().unwrap();
        b.discard();
        assert_eq!(b.stats().discards, 1);
    }

    #[test]
    fn faults_fire_once() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        b.configure(&config()).unwrap();

        window.inject(HeadlessFault::AcquireTimeout);
        assert_eq!(b.acquire_next_image(), Err(BackendError::Timeout));
        assert_eq!(b.acquire_next_image(), Ok(0));
        b.present().unwrap();

        window.inject(HeadlessFault::AcquireOutOfRange);
        assert_eq!(b.acquire_next_image(), Ok(3));
        b.discard();
        assert_eq!(b.acquire_next_image(), Ok(2));
    }

    #[test]
    fn empty_swapchain_fault_allocates_nothing() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        window.inject(HeadlessFault::EmptySwapchain);
        assert_eq!(b.configure(&config()).unwrap(), 0);
        assert!(matches!(b.acquire_next_image(), Err(BackendError::Other(_))));
        assert_eq!(b.configure(&config()).unwrap(), 3);
    }

    #[test]
    fn window_capabilities_override_device() {
        let window = HeadlessWindow::new(4, 2);
        let b = backend(&window);
        let mut info = b.query_info();
        info.image_count = 2..=2;
        window.set_capabilities(info.clone());
        assert_eq!(b.query_info(), info);
    }

    #[test]
    fn unconfigure_releases_once() {
        let window = HeadlessWindow::new(4, 2);
        let mut b = backend(&window);
        b.configure(&config()).unwrap();
        b.unconfigure();
        b.unconfigure();
        assert_eq!(b.stats().releases, 1);
        assert!(!b.is_configured());
    }
}
