//! Image processing — pure Rust, zero external dependencies.
//!
//! | Backend | Behavior |
//! |---|---|
//! | [`RasterBackend`] | decode → Lanczos3 square resize → PNG/WebP/JPEG/ICO encode |
//! | [`NullBackend`] | pass every source through unmodified |
//!
//! Callers depend only on the [`ImageBackend`] contract, never a concrete
//! backend. The backend is chosen once, at composition time, from the
//! `image_backend` configuration key via [`select_backend`].

pub mod backend;
pub mod raster;

pub use backend::{BackendError, IconFormat, ImageBackend, NullBackend};
pub use raster::RasterBackend;

use crate::config::BackendKind;

/// Resolve the configured backend. A plain match — no runtime reflection.
pub fn select_backend(kind: BackendKind) -> Box<dyn ImageBackend + Send + Sync> {
    match kind {
        BackendKind::Raster => Box::new(RasterBackend::new()),
        BackendKind::None => Box::new(NullBackend::new()),
    }
}
