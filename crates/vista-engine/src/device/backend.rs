//! Device/backend contract consumed by [`Surface`](crate::surface::Surface).
//!
//! A *device* binds windows to backend presentation objects. The *backend*
//! owns the native swapchain and speaks in slot indices; the surface layers
//! the state machine and image cache on top.

use crate::surface::{BackendError, SurfaceConfig, SurfaceError, SurfaceInfo};

/// A graphics device that can present to windows.
///
/// Surfaces hold devices through `Arc`, so a device outlives every surface
/// created from it.
pub trait Device {
    /// Whatever the device needs to bind a presentation target.
    type Window;

    /// Presentation object created per window.
    type Backend: SurfaceBackend;

    /// Binds a presentation target to `window`.
    ///
    /// Fails with [`SurfaceError::Init`] if this device cannot present to the
    /// window.
    fn create_surface_backend(&self, window: Self::Window) -> Result<Self::Backend, SurfaceError>;
}

/// Backend presentation object bound to a single window.
///
/// Implementations do not need to guard call order; [`Surface`] only calls
/// `acquire_next_image` while configured with no image in flight, and
/// `present`/`discard` only with an image in flight.
///
/// [`Surface`]: crate::surface::Surface
pub trait SurfaceBackend {
    /// Backend-native image wrapped by [`SurfaceImage`](crate::surface::SurfaceImage).
    type Image;

    /// Queries current capabilities.
    fn query_info(&self) -> SurfaceInfo;

    /// (Re)creates the presentation resource. `config` is already validated
    /// and its image count clamped.
    ///
    /// Returns the number of images actually allocated.
    fn configure(&mut self, config: &SurfaceConfig) -> Result<u32, BackendError>;

    /// Releases the presentation resource.
    fn unconfigure(&mut self);

    /// Waits for the next free image and returns its slot index.
    fn acquire_next_image(&mut self) -> Result<u32, BackendError>;

    /// Native image for slot `index`. Called once per slot per epoch.
    fn image(&self, index: u32) -> Self::Image;

    /// Queues the acquired image for display.
    fn present(&mut self) -> Result<(), BackendError>;

    /// Gives the acquired image back without displaying it.
    fn discard(&mut self);
}
