//! Presentation surface.
//!
//! A [`Surface`] binds a window to a [`Device`](crate::device::Device) and runs
//! the presentation cycle:
//!
//! ```text
//! new → [configure → (acquire_next_image → present)* → unconfigure]*
//! ```
//!
//! Images returned by acquisition are cached per configuration epoch; every
//! successful `configure` starts a new epoch.

mod config;
mod error;
mod image;
mod info;
mod state;

pub use config::SurfaceConfig;
pub use error::{BackendError, ConfigError, SurfaceError};
pub use image::SurfaceImage;
pub use info::SurfaceInfo;
pub use state::Surface;
