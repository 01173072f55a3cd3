//! Vista engine crate.
//!
//! Presentation surfaces: capability query, swapchain configuration and the
//! acquire/present cycle, over wgpu or a headless device.

pub mod device;
pub mod surface;

pub mod logging;

pub use device::{Device, SurfaceBackend};
pub use surface::{Surface, SurfaceConfig, SurfaceError, SurfaceImage, SurfaceInfo};
