use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use raw_window_handle as rwh;
use winit::window::Window;

use crate::surface::{BackendError, SurfaceConfig, SurfaceError, SurfaceInfo};

use super::DeviceInit;
use super::backend::{Device, SurfaceBackend};
use super::surface::{self, IMAGE_COUNT_MAX, IMAGE_COUNT_MIN};

/// Owns the wgpu core objects surfaces present through.
///
/// Share it through `Arc`; every [`Surface`](crate::surface::Surface) created
/// from it keeps it alive.
pub struct WgpuDevice {
    /// wgpu instance used to create the adapter and surfaces.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    prefer_srgb: bool,
    alpha_mode: Option<wgpu::CompositeAlphaMode>,
}

impl WgpuDevice {
    /// Creates the instance, adapter, device and queue.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: DeviceInit) -> Result<Self> {
        let DeviceInit {
            backends,
            power_preference,
            prefer_srgb,
            alpha_mode,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vista-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("using adapter {:?}", adapter.get_info().name);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            prefer_srgb,
            alpha_mode,
        })
    }

    /// Returns the wgpu instance.
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Returns the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/// Raw platform handles for binding a surface without a window object.
#[derive(Debug, Copy, Clone)]
pub struct RawHandles {
    display: rwh::RawDisplayHandle,
    window: rwh::RawWindowHandle,
}

impl RawHandles {
    /// # Safety
    ///
    /// Both handles must stay valid for as long as any surface created from
    /// them exists.
    pub unsafe fn new(display: rwh::RawDisplayHandle, window: rwh::RawWindowHandle) -> Self {
        Self { display, window }
    }
}

impl rwh::HasWindowHandle for RawHandles {
    fn window_handle(&self) -> Result<rwh::WindowHandle<'_>, rwh::HandleError> {
        // SAFETY: validity is promised by `RawHandles::new`.
        Ok(unsafe { rwh::WindowHandle::borrow_raw(self.window) })
    }
}

impl rwh::HasDisplayHandle for RawHandles {
    fn display_handle(&self) -> Result<rwh::DisplayHandle<'_>, rwh::HandleError> {
        // SAFETY: validity is promised by `RawHandles::new`.
        Ok(unsafe { rwh::DisplayHandle::borrow_raw(self.display) })
    }
}

/// Presentation target accepted by [`WgpuDevice`].
#[derive(Debug, Clone)]
pub enum WgpuWindow {
    /// A winit window. The surface keeps it alive.
    Window(Arc<Window>),
    /// Raw platform handles; see [`RawHandles::new`].
    Raw(RawHandles),
}

impl From<Arc<Window>> for WgpuWindow {
    fn from(window: Arc<Window>) -> Self {
        WgpuWindow::Window(window)
    }
}

impl Device for WgpuDevice {
    type Window = WgpuWindow;
    type Backend = WgpuSurface;

    fn create_surface_backend(&self, window: WgpuWindow) -> Result<WgpuSurface, SurfaceError> {
        let (surface, keep_alive) = match window {
            WgpuWindow::Window(window) => {
                let surface = self
                    .instance
                    .create_surface(Arc::clone(&window))
                    .map_err(|e| SurfaceError::Init(e.to_string()))?;
                (surface, Some(window))
            }
            WgpuWindow::Raw(handles) => {
                // SAFETY: `RawHandles::new` requires the handles to outlive
                // the surface.
                let surface = unsafe {
                    let target = wgpu::SurfaceTargetUnsafe::from_window(&handles)
                        .map_err(|e| SurfaceError::Init(e.to_string()))?;
                    self.instance.create_surface_unsafe(target)
                }
                .map_err(|e| SurfaceError::Init(e.to_string()))?;
                (surface, None)
            }
        };

        if !self.adapter.is_surface_supported(&surface) {
            return Err(SurfaceError::Init(
                "adapter cannot present to this window".to_string(),
            ));
        }

        Ok(WgpuSurface {
            surface,
            adapter: self.adapter.clone(),
            device: self.device.clone(),
            prefer_srgb: self.prefer_srgb,
            alpha_mode: self.alpha_mode,
            configured: false,
            slots: Vec::new(),
            next_index: 0,
            current: None,
            _window: keep_alive,
        })
    }
}

type Slot = Rc<RefCell<Option<wgpu::Texture>>>;

/// Native image for one wgpu swapchain slot.
///
/// Holds the texture only while the slot is acquired.
#[derive(Debug, Clone)]
pub struct WgpuImage {
    slot: Slot,
}

impl WgpuImage {
    /// Texture currently backing this slot, if acquired.
    pub fn texture(&self) -> Option<wgpu::Texture> {
        self.slot.borrow().clone()
    }

    /// Creates a default view of the acquired texture.
    pub fn create_view(&self) -> Option<wgpu::TextureView> {
        self.slot
            .borrow()
            .as_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
    }
}

/// wgpu surface bound to a window.
pub struct WgpuSurface {
    /// Declared before `_window` so it is dropped first.
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    prefer_srgb: bool,
    alpha_mode: Option<wgpu::CompositeAlphaMode>,
    configured: bool,
    slots: Vec<Slot>,
    next_index: u32,
    /// Acquired frame and its slot index.
    current: Option<(u32, wgpu::SurfaceTexture)>,
    _window: Option<Arc<Window>>,
}

impl WgpuSurface {
    /// Drops the acquired frame, if any. wgpu discards it on drop.
    fn release_current(&mut self) {
        if let Some((index, frame)) = self.current.take() {
            if let Some(slot) = self.slots.get(index as usize) {
                slot.borrow_mut().take();
            }
            drop(frame);
        }
    }
}

impl SurfaceBackend for WgpuSurface {
    type Image = WgpuImage;

    fn query_info(&self) -> SurfaceInfo {
        let caps = self.surface.get_capabilities(&self.adapter);
        let preferred_format = surface::choose_surface_format(&caps, self.prefer_srgb)
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        SurfaceInfo {
            preferred_format,
            supported_usage: caps.usages,
            formats: caps.formats,
            image_count: IMAGE_COUNT_MIN..=IMAGE_COUNT_MAX,
            max_extent: self.device.limits().max_texture_dimension_2d,
        }
    }

    fn configure(&mut self, config: &SurfaceConfig) -> Result<u32, BackendError> {
        self.release_current();

        let caps = self.surface.get_capabilities(&self.adapter);
        if caps.formats.is_empty() {
            // The adapter can no longer present to this window.
            self.slots.clear();
            self.configured = false;
            return Err(BackendError::Lost);
        }

        let wgpu_config = wgpu::SurfaceConfiguration {
            usage: config.usage,
            format: config.format,
            width: config.width,
            height: config.height,
            present_mode: surface::choose_present_mode(&caps, config.vsync),
            alpha_mode: surface::choose_alpha_mode(&caps, self.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: surface::frame_latency(config.desired_image_count),
        };

        // Surface::configure reports failures through the device error
        // handler, which panics unless a scope captures them. Scopes pop LIFO.
        let oom_scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.surface.configure(&self.device, &wgpu_config);
        let validation = pollster::block_on(validation_scope.pop());
        let oom = pollster::block_on(oom_scope.pop());

        if let Some(err) = validation.or(oom) {
            log::error!("wgpu rejected surface configuration: {err}");
            self.slots.clear();
            self.configured = false;
            return Err(surface::map_device_error(err));
        }

        let count = wgpu_config.desired_maximum_frame_latency + 1;
        self.slots = (0..count).map(|_| Rc::new(RefCell::new(None))).collect();
        self.next_index = 0;
        self.configured = true;

        Ok(count)
    }

    fn unconfigure(&mut self) {
        // wgpu has no explicit unconfigure; the swapchain is recreated on the
        // next configure.
        self.release_current();
        self.slots.clear();
        self.configured = false;
    }

    fn acquire_next_image(&mut self) -> Result<u32, BackendError> {
        if !self.configured {
            return Err(BackendError::Other("surface not configured".to_string()));
        }

        let frame = self
            .surface
            .get_current_texture()
            .map_err(surface::map_surface_error)?;
        if frame.suboptimal {
            log::debug!("acquired suboptimal surface texture");
        }

        let index = self.next_index;
        self.next_index = (index + 1) % self.slots.len() as u32;
        if let Some(slot) = self.slots.get(index as usize) {
            *slot.borrow_mut() = Some(frame.texture.clone());
        }
        self.current = Some((index, frame));

        Ok(index)
    }

    fn image(&self, index: u32) -> WgpuImage {
        let slot = self
            .slots
            .get(index as usize)
            .cloned()
            .unwrap_or_else(|| Rc::new(RefCell::new(None)));
        WgpuImage { slot }
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let (index, frame) = self
            .current
            .take()
            .ok_or_else(|| BackendError::Other("no acquired surface texture".to_string()))?;

        if let Some(slot) = self.slots.get(index as usize) {
            slot.borrow_mut().take();
        }
        frame.present();

        Ok(())
    }

    fn discard(&mut self) {
        self.release_current();
    }
}
