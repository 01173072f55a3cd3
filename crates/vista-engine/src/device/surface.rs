//! Capability selection helpers for wgpu surfaces.

use crate::surface::BackendError;

/// Buffering depths exposed for wgpu surfaces.
///
/// wgpu sizes its swapchain from `desired_maximum_frame_latency`; an image
/// count of `n` maps to a latency of `n - 1`.
pub(crate) const IMAGE_COUNT_MIN: u32 = 2;
pub(crate) const IMAGE_COUNT_MAX: u32 = 4;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Maps the vsync flag onto a supported present mode.
///
/// FIFO is always available. Without vsync, mailbox is preferred over
/// immediate since it does not tear.
pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    vsync: bool,
) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }

    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|m| caps.present_modes.contains(m))
        .unwrap_or_else(|| {
            log::warn!("vsync off requested but unsupported; falling back to FIFO");
            wgpu::PresentMode::Fifo
        })
}

pub(crate) fn frame_latency(image_count: u32) -> u32 {
    image_count.clamp(IMAGE_COUNT_MIN, IMAGE_COUNT_MAX) - 1
}

pub(crate) fn map_surface_error(err: wgpu::SurfaceError) -> BackendError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => BackendError::Lost,
        wgpu::SurfaceError::Timeout => BackendError::Timeout,
        wgpu::SurfaceError::OutOfMemory => BackendError::Other("out of memory".to_string()),
        wgpu::SurfaceError::Other => BackendError::Other("unknown surface error".to_string()),
    }
}

/// Maps an error captured by a device error scope.
pub(crate) fn map_device_error(err: wgpu::Error) -> BackendError {
    match err {
        wgpu::Error::OutOfMemory { .. } => BackendError::Other("out of memory".to_string()),
        wgpu::Error::Validation { description, .. } | wgpu::Error::Internal { description, .. } => {
            BackendError::Other(description)
        }
    }
}
