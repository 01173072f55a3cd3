//! Devices and backend presentation objects.
//!
//! This module is responsible for:
//! - the [`Device`] / [`SurfaceBackend`] contract surfaces are built on
//! - the wgpu device (Instance/Adapter/Device/Queue) and its window surfaces
//! - a headless device for running without a GPU

mod backend;
mod gpu;
mod headless;
mod init;
mod surface;

pub use backend::{Device, SurfaceBackend};
pub use gpu::{RawHandles, WgpuDevice, WgpuImage, WgpuSurface, WgpuWindow};
pub use headless::{
    HeadlessDevice, HeadlessFault, HeadlessImage, HeadlessStats, HeadlessSurface, HeadlessWindow,
};
pub use init::DeviceInit;
