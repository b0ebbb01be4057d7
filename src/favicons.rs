//! Favicon set generation.
//!
//! Derives the standard favicon set from a single source image:
//!
//! ```text
//! favicon-16x16.png, favicon-32x32.png, favicon-48x48.png   # classic
//! apple-touch-icon.png                                      # 180px
//! icon-192.png, icon-512.png                                # install icons
//! favicon.ico                                               # from the smallest size >= 32
//! ```
//!
//! The set is driven by `favicons.sizes`; the three well-known names above
//! fall out of the declared pixel sizes.

use crate::compile::normalize_public_path;
use crate::config::{FaviconsConfig, PwaConfig};
use crate::imaging::{BackendError, IconFormat, ImageBackend};
use crate::types::BuildOutput;
use rayon::prelude::*;
use std::path::Path;

/// One planned favicon variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconVariant {
    pub size: u32,
    pub format: IconFormat,
    pub public_url: String,
}

/// Conventional file name for a favicon size.
pub fn favicon_file_name(size: u32) -> String {
    match size {
        180 => "apple-touch-icon.png".to_string(),
        192 | 512 => format!("icon-{size}.png"),
        n => format!("favicon-{n}x{n}.png"),
    }
}

/// Plan the full set for a favicons section: one PNG per declared size,
/// plus `favicon.ico` when requested.
pub fn plan_set(favicons: &FaviconsConfig) -> Vec<FaviconVariant> {
    let prefix = if favicons.public_prefix.is_empty() {
        String::new()
    } else {
        normalize_public_path(&favicons.public_prefix)
    };

    let mut variants: Vec<FaviconVariant> = favicons
        .sizes
        .iter()
        .map(|&size| FaviconVariant {
            size,
            format: IconFormat::Png,
            public_url: format!("{prefix}/{}", favicon_file_name(size)),
        })
        .collect();

    if favicons.ico {
        // ICO wants a crisp small bitmap: the smallest declared size that
        // is still at least 32px, or the largest size if all are tiny.
        let ico_size = favicons
            .sizes
            .iter()
            .copied()
            .filter(|&s| s >= 32)
            .min()
            .or_else(|| favicons.sizes.iter().copied().max());
        if let Some(size) = ico_size {
            variants.push(FaviconVariant {
                size,
                format: IconFormat::Ico,
                public_url: format!("{prefix}/favicon.ico"),
            });
        }
    }
    variants
}

/// Build the favicon set. Returns `None` when the feature is disabled or
/// the section is absent.
pub fn build(
    config: &PwaConfig,
    root: &Path,
    backend: &dyn ImageBackend,
) -> Result<Option<Vec<BuildOutput>>, BackendError> {
    let Some(favicons) = config.favicons.as_ref().filter(|f| f.enabled) else {
        return Ok(None);
    };

    let source = root.join(&favicons.src);
    let outputs: Vec<BuildOutput> = plan_set(favicons)
        .par_iter()
        .map(|variant| {
            backend
                .process(&source, variant.size, variant.format)
                .map(|bytes| BuildOutput::new(variant.public_url.clone(), bytes))
        })
        .collect::<Result<_, BackendError>>()?;

    Ok(Some(outputs))
}
