//! Pure Rust raster backend — zero external dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, ICO) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_to_fill` with `Lanczos3` |
//! | Encode → PNG / WebP / JPEG / ICO | `image` crate encoders |
//!
//! SVG sources are not rasterized: they can only be referenced at size `0`
//! (pass-through). Rasterizing vector art would drag in a rendering engine
//! for a case the manifest spec already covers with `sizes: "any"`.

use super::backend::{BackendError, IconFormat, ImageBackend};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// ICO directory entries store dimensions in a single byte.
const ICO_MAX_SIZE: u32 = 256;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RasterBackend;

impl RasterBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode a resized image into the target format.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first;
/// everything else keeps RGBA.
fn encode(img: DynamicImage, format: IconFormat, path: &Path) -> Result<Vec<u8>, BackendError> {
    let (img, target) = match format {
        IconFormat::Png => (DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::Png),
        IconFormat::Webp => (DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::WebP),
        IconFormat::Jpeg => (DynamicImage::ImageRgb8(img.to_rgb8()), ImageFormat::Jpeg),
        IconFormat::Ico => (DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::Ico),
    };
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), target)
        .map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to encode {} as {}: {}",
                path.display(),
                format.extension(),
                e
            ))
        })?;
    Ok(buf)
}

impl ImageBackend for RasterBackend {
    fn process(
        &self,
        source: &Path,
        size: u32,
        format: IconFormat,
    ) -> Result<Vec<u8>, BackendError> {
        if size == 0 {
            // "Any size": the source is referenced directly.
            return Ok(std::fs::read(source)?);
        }
        if is_svg(source) {
            return Err(BackendError::Unsupported(format!(
                "{}: SVG sources cannot be rasterized; declare sizes = [0] to pass them through",
                source.display()
            )));
        }
        if format == IconFormat::Ico && size > ICO_MAX_SIZE {
            return Err(BackendError::Unsupported(format!(
                "ICO supports at most {ICO_MAX_SIZE}px, requested {size}"
            )));
        }

        let img = load_image(source)?;
        let resized = img.resize_to_fill(size, size, FilterType::Lanczos3);
        encode(resized, format, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Write a small PNG fixture and return its path.
    fn png_fixture(tmp: &TempDir, width: u32, height: u32) -> std::path::PathBuf {
        let path = tmp.path().join("source.png");
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([180, 40, 40, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn size_zero_passes_source_through() {
        let tmp = TempDir::new().unwrap();
        let path = png_fixture(&tmp, 8, 8);
        let original = std::fs::read(&path).unwrap();

        let backend = RasterBackend::new();
        let bytes = backend.process(&path, 0, IconFormat::Png).unwrap();
        assert_eq!(bytes, original);
    }

    #[test]
    fn resizes_to_requested_square() {
        let tmp = TempDir::new().unwrap();
        let path = png_fixture(&tmp, 64, 32);

        let backend = RasterBackend::new();
        let bytes = backend.process(&path, 16, IconFormat::Png).unwrap();

        let out = image::load_from_memory(&bytes).unwrap();
        assert_eq!((out.width(), out.height()), (16, 16));
    }

    #[test]
    fn encodes_webp_and_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = png_fixture(&tmp, 32, 32);
        let backend = RasterBackend::new();

        let webp = backend.process(&path, 16, IconFormat::Webp).unwrap();
        assert!(webp.starts_with(b"RIFF"));

        let jpeg = backend.process(&path, 16, IconFormat::Jpeg).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn encodes_ico() {
        let tmp = TempDir::new().unwrap();
        let path = png_fixture(&tmp, 64, 64);
        let backend = RasterBackend::new();

        let ico = backend.process(&path, 48, IconFormat::Ico).unwrap();
        // ICONDIR header: reserved 0, type 1.
        assert!(ico.starts_with(&[0, 0, 1, 0]));
    }

    #[test]
    fn ico_above_256_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = png_fixture(&tmp, 64, 64);
        let backend = RasterBackend::new();

        let result = backend.process(&path, 512, IconFormat::Ico);
        assert!(matches!(result, Err(BackendError::Unsupported(_))));
    }

    #[test]
    fn svg_at_nonzero_size_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("icon.svg");
        std::fs::write(&path, "<svg xmlns='http://www.w3.org/2000/svg'/>").unwrap();

        let backend = RasterBackend::new();
        let result = backend.process(&path, 48, IconFormat::Png);
        assert!(matches!(result, Err(BackendError::Unsupported(_))));
    }

    #[test]
    fn svg_at_size_zero_passes_through() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("icon.svg");
        std::fs::write(&path, "<svg xmlns='http://www.w3.org/2000/svg'/>").unwrap();

        let backend = RasterBackend::new();
        let bytes = backend.process(&path, 0, IconFormat::Png).unwrap();
        assert!(bytes.starts_with(b"<svg"));
    }

    #[test]
    fn unreadable_source_is_io_error() {
        let backend = RasterBackend::new();
        let result = backend.process(Path::new("/no/such/file.png"), 48, IconFormat::Png);
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
