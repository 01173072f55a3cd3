//! Error types for the presentation surface.

/// Reasons a [`SurfaceConfig`](super::SurfaceConfig) is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("surface extent must be non-zero, got {width}x{height}")]
    ZeroExtent { width: u32, height: u32 },

    /// The backend cannot allocate images this large.
    #[error("surface extent {width}x{height} exceeds the maximum of {max}")]
    ExtentTooLarge { width: u32, height: u32, max: u32 },

    /// The format is not in the surface's supported format list.
    #[error("unsupported surface format: {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),

    /// The usage requests flags the surface does not support.
    #[error("unsupported surface usage: requested {requested:?}, supported {supported:?}")]
    UnsupportedUsage {
        requested: wgpu::TextureUsages,
        supported: wgpu::TextureUsages,
    },
}

/// Errors reported by a [`SurfaceBackend`](crate::device::SurfaceBackend).
///
/// Backends speak in these terms; [`Surface`](super::Surface) maps them into
/// [`SurfaceError`] for callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The presentation target is gone or out of date.
    #[error("presentation target lost")]
    Lost,

    /// No image became available in time.
    #[error("timed out waiting for a presentable image")]
    Timeout,

    /// The backend cannot create a presentation resource for this request.
    #[error("unsupported by backend: {0}")]
    Unsupported(String),

    /// Any other device-level failure.
    #[error("{0}")]
    Other(String),
}

/// Errors returned by [`Surface`](super::Surface) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The backend could not bind a presentable surface to the window/device.
    ///
    /// Fatal to the surface instance.
    #[error("failed to create surface: {0}")]
    Init(String),

    /// The configuration does not fit the surface's capabilities.
    #[error("invalid surface configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Acquisition was attempted while unconfigured.
    #[error("surface is not configured")]
    NotConfigured,

    /// An image is already in flight and has not been presented.
    #[error("an acquired image has not been presented yet")]
    AcquireInProgress,

    /// `present` was called without an in-flight image.
    #[error("no acquired image to present")]
    NothingToPresent,

    /// The presentation target became invalid (resize, minimize, destroy).
    ///
    /// Recover with `unconfigure` followed by `configure`.
    #[error("surface lost; reconfigure to continue")]
    SurfaceLost,

    /// The backend did not hand out an image in time. Skip the frame.
    #[error("timed out acquiring surface image")]
    Timeout,

    /// Other backend failure.
    #[error("surface backend error: {0}")]
    Backend(String),
}

impl From<BackendError> for SurfaceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Lost => SurfaceError::SurfaceLost,
            BackendError::Timeout => SurfaceError::Timeout,
            BackendError::Unsupported(msg) | BackendError::Other(msg) => {
                SurfaceError::Backend(msg)
            }
        }
    }
}

impl SurfaceError {
    /// Returns `true` for errors caused by calling operations out of order.
    pub fn is_sequencing(&self) -> bool {
        matches!(
            self,
            SurfaceError::NotConfigured
                | SurfaceError::AcquireInProgress
                | SurfaceError::NothingToPresent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_lost_maps_to_surface_lost() {
        assert_eq!(SurfaceError::from(BackendError::Lost), SurfaceError::SurfaceLost);
        assert_eq!(SurfaceError::from(BackendError::Timeout), SurfaceError::Timeout);
    }

    #[test]
    fn backend_failures_keep_their_message() {
        let err = SurfaceError::from(BackendError::Unsupported("no mailbox".into()));
        assert_eq!(err, SurfaceError::Backend("no mailbox".into()));
    }

    #[test]
    fn sequencing_errors_are_flagged() {
        assert!(SurfaceError::NotConfigured.is_sequencing());
        assert!(SurfaceError::NothingToPresent.is_sequencing());
        assert!(!SurfaceError::SurfaceLost.is_sequencing());
    }
}
