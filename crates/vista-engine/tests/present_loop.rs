use std::rc::Rc;
use std::sync::Arc;

use vista_engine::device::{HeadlessDevice, HeadlessWindow};
use vista_engine::{Surface, SurfaceConfig, SurfaceError};

fn config() -> SurfaceConfig {
    SurfaceConfig {
        format: wgpu::TextureFormat::Bgra8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        width: 800,
        height: 600,
        desired_image_count: 3,
        vsync: true,
    }
}

#[test]
fn hundred_frames_without_errors_or_leaks() {
    let window = HeadlessWindow::new(800, 600);
    let mut surface = Surface::new(Arc::new(HeadlessDevice::default()), window.clone()).unwrap();

    surface.configure(config()).unwrap();
    assert_eq!(surface.config(), Some(&config()));

    let first = surface.acquire_next_image().unwrap();
    assert_eq!((first.width(), first.height()), (800, 600));
    first.native().fill([10, 20, 30, 255]);
    surface.present().unwrap();

    let image_count = surface.image_count().unwrap() as usize;
    for frame in 0..100u8 {
        let image = surface.acquire_next_image().unwrap();
        image.native().fill([frame, 0, 0, 255]);
        surface.present().unwrap();
        assert!(surface.cached_image_count() <= image_count);
    }

    assert_eq!(surface.cached_image_count(), image_count);
    assert_eq!(surface.backend().stats().presents, 101);
    assert_eq!(surface.backend().stats().acquires, 101);
}

#[test]
fn resize_loop_recovers_like_a_window_handler() {
    let window = HeadlessWindow::new(800, 600);
    let mut surface = Surface::new(Arc::new(HeadlessDevice::default()), window.clone()).unwrap();
    surface.configure(config()).unwrap();

    let before = surface.acquire_next_image().unwrap();
    surface.present().unwrap();

    // Minimized: zero size, surface parked.
    window.resize(0, 0);
    assert_eq!(surface.acquire_next_image().unwrap_err(), SurfaceError::SurfaceLost);
    surface.unconfigure();
    assert_eq!(surface.acquire_next_image().unwrap_err(), SurfaceError::NotConfigured);

    // Restored at a new size.
    window.resize(1280, 720);
    let (w, h) = window.size();
    surface.configure(surface.default_config(w, h)).unwrap();

    let after = surface.acquire_next_image().unwrap();
    assert_eq!((after.width(), after.height()), (1280, 720));
    assert!(!Rc::ptr_eq(&before, &after));
    assert!(!surface.is_current(&before));
    surface.present().unwrap();
}
