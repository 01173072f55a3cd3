//! Opens a window and drives a presentation surface through the wgpu device.
//!
//! Clears each acquired image with a slowly cycling color.

mod config;
mod runtime;

use anyhow::Result;
use vista_engine::device::DeviceInit;
use vista_engine::logging::{init_logging, LoggingConfig};

use crate::config::ViewerConfig;
use crate::runtime::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = ViewerConfig::from_env();
    log::info!(
        "starting viewer: vsync {}, {} images",
        config.vsync,
        config.desired_image_count
    );

    Runtime::run(config, DeviceInit::default())
}
