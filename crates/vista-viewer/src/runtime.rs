use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use vista_engine::device::{DeviceInit, WgpuDevice, WgpuWindow};
use vista_engine::{Surface, SurfaceError};

use crate::config::ViewerConfig;

/// Entry point for the viewer loop.
pub struct Runtime;

impl Runtime {
    pub fn run(config: ViewerConfig, device_init: DeviceInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let device = pollster::block_on(WgpuDevice::new(device_init))
            .context("GPU initialization failed")?;
        let mut state = AppState::new(config, Arc::new(device));

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct WindowEntry {
    window: Arc<Window>,
    surface: Surface<WgpuDevice>,
}

struct AppState {
    config: ViewerConfig,
    device: Arc<WgpuDevice>,
    entry: Option<WindowEntry>,

    started: Instant,
    frames: u64,
    last_report: Instant,

    /// First fatal error; returned from `Runtime::run`.
    error: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: ViewerConfig, device: Arc<WgpuDevice>) -> Self {
        let now = Instant::now();
        Self {
            config,
            device,
            entry: None,
            started: now,
            frames: 0,
            last_report: now,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.entry = None;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let mut surface = Surface::new(
            Arc::clone(&self.device),
            WgpuWindow::from(Arc::clone(&window)),
        )
        .context("failed to create surface")?;

        let info = surface.info();
        log::info!(
            "surface: preferred {:?}, {} formats, usage {:?}",
            info.preferred_format,
            info.formats.len(),
            info.supported_usage
        );

        configure_for_size(&mut surface, &self.config, window.inner_size())?;
        window.request_redraw();

        self.entry = Some(WindowEntry { window, surface });
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(entry) = self.entry.as_mut() else {
            return Ok(());
        };

        // Minimized windows stay unconfigured until restored.
        if entry.surface.config().is_none() {
            return Ok(());
        }

        let image = match entry.surface.acquire_next_image() {
            Ok(image) => image,
            Err(SurfaceError::SurfaceLost) => {
                log::debug!("surface lost on acquire; reconfiguring");
                return reconfigure(entry, &self.config);
            }
            Err(SurfaceError::Timeout) => return Ok(()),
            Err(err) => return Err(err).context("failed to acquire surface image"),
        };

        let view = image
            .native()
            .create_view()
            .context("acquired surface image has no texture")?;

        let device = self.device.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vista frame encoder"),
        });

        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("vista clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(self.started.elapsed().as_secs_f64())),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.device.queue().submit(std::iter::once(encoder.finish()));
        drop(view);

        entry.window.pre_present_notify();
        match entry.surface.present() {
            Ok(()) => {}
            Err(SurfaceError::SurfaceLost) => {
                log::debug!("surface lost on present; reconfiguring");
                return reconfigure(entry, &self.config);
            }
            Err(err) => return Err(err).context("failed to present surface image"),
        }

        self.frames += 1;
        let since = self.last_report.elapsed();
        if since.as_secs() >= 1 {
            log::debug!(
                "{:.1} fps ({}x{})",
                self.frames as f64 / since.as_secs_f64(),
                image.width(),
                image.height()
            );
            self.frames = 0;
            self.last_report = Instant::now();
        }

        Ok(())
    }
}

/// Configures for a non-empty size, or parks the surface while minimized.
fn configure_for_size(
    surface: &mut Surface<WgpuDevice>,
    config: &ViewerConfig,
    size: PhysicalSize<u32>,
) -> Result<()> {
    if size.width == 0 || size.height == 0 {
        surface.unconfigure();
        return Ok(());
    }

    let surface_config = surface
        .default_config(size.width, size.height)
        .with_image_count(config.desired_image_count)
        .with_vsync(config.vsync);

    surface
        .configure(surface_config)
        .with_context(|| format!("failed to configure surface at {}x{}", size.width, size.height))
}

fn reconfigure(entry: &mut WindowEntry, config: &ViewerConfig) -> Result<()> {
    entry.surface.unconfigure();
    configure_for_size(&mut entry.surface, config, entry.window.inner_size())
}

fn clear_color(t: f64) -> wgpu::Color {
    let phase = |offset: f64| 0.5 + 0.5 * (t * 0.5 + offset).sin();
    wgpu::Color {
        r: phase(0.0) * 0.3,
        g: phase(2.1) * 0.3,
        b: phase(4.2) * 0.3,
        a: 1.0,
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                let Some(entry) = self.entry.as_mut() else {
                    return;
                };
                if let Err(e) = configure_for_size(&mut entry.surface, &self.config, new_size) {
                    self.fail(event_loop, e);
                    return;
                }
                entry.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let Some(entry) = self.entry.as_mut() else {
                    return;
                };
                let new_size = entry.window.inner_size();
                if let Err(e) = configure_for_size(&mut entry.surface, &self.config, new_size) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_color_stays_dim_and_opaque() {
        for i in 0..50 {
            let c = clear_color(i as f64 * 0.37);
            assert!((0.0..=0.3).contains(&c.r));
            assert!((0.0..=0.3).contains(&c.g));
            assert!((0.0..=0.3).contains(&c.b));
            assert_eq!(c.a, 1.0);
        }
    }
}
