//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the single operation every backend must
//! support: produce the bytes of one icon variant from a source image. The
//! production implementation is
//! [`RasterBackend`](super::raster::RasterBackend) — pure Rust, zero external
//! dependencies. [`NullBackend`] passes sources through unmodified, for
//! SVG-only deployments and tests.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Target encoding for a derived icon variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconFormat {
    Png,
    Webp,
    Jpeg,
    Ico,
}

impl IconFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
            Self::Ico => "ico",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Ico => "image/x-icon",
        }
    }
}

/// Trait for image processing backends.
///
/// One operation: read `source`, produce a square variant of `size` pixels
/// encoded as `format`. A `size` of `0` means "pass through": return the
/// source bytes unresized and unrecoded, used for vector sources referenced
/// directly from the manifest. `Sync` so variants can be derived in parallel.
pub trait ImageBackend: Sync {
    fn process(&self, source: &Path, size: u32, format: IconFormat) -> Result<Vec<u8>, BackendError>;
}

/// Backend that never touches pixels: every request returns the source
/// bytes unmodified. Satisfies the contract for deployments whose icon
/// sources are already final (single SVG referenced at "any" size).
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for NullBackend {
    fn process(
        &self,
        source: &Path,
        _size: u32,
        _format: IconFormat,
    ) -> Result<Vec<u8>, BackendError> {
        Ok(fs::read(source)?)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records requests without touching the filesystem.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedOp {
        pub source: String,
        pub size: u32,
        pub format: IconFormat,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn process(
            &self,
            source: &Path,
            size: u32,
            format: IconFormat,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp {
                source: source.to_string_lossy().to_string(),
                size,
                format,
            });
            Ok(format!("mock-{}-{}", size, format.extension()).into_bytes())
        }
    }

    #[test]
    fn mock_records_requests() {
        let backend = MockBackend::new();
        let bytes = backend
            .process(Path::new("/icons/app.svg"), 48, IconFormat::Webp)
            .unwrap();
        assert_eq!(bytes, b"mock-48-webp");

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].source, "/icons/app.svg");
        assert_eq!(ops[0].size, 48);
        assert_eq!(ops[0].format, IconFormat::Webp);
    }

    #[test]
    fn null_backend_passes_source_through() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("icon.svg");
        fs::write(&source, b"<svg/>").unwrap();

        let backend = NullBackend::new();
        // Any size and format: the source bytes come back unmodified.
        assert_eq!(backend.process(&source, 0, IconFormat::Png).unwrap(), b"<svg/>");
        assert_eq!(
            backend.process(&source, 512, IconFormat::Webp).unwrap(),
            b"<svg/>"
        );
    }

    #[test]
    fn null_backend_unreadable_source_is_error() {
        let backend = NullBackend::new();
        let result = backend.process(Path::new("/does/not/exist.svg"), 0, IconFormat::Png);
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn icon_format_extensions_and_mime_types() {
        assert_eq!(IconFormat::Png.extension(), "png");
        assert_eq!(IconFormat::Jpeg.extension(), "jpg");
        assert_eq!(IconFormat::Webp.mime_type(), "image/webp");
        assert_eq!(IconFormat::Ico.mime_type(), "image/x-icon");
    }
}
