//! Web manifest assembly.
//!
//! Takes the normalized configuration and produces two things: the
//! serialized manifest document, and one physical icon asset per declared
//! `(size, format)` combination, each with its own derived public URL.
//!
//! ## Derived URLs
//!
//! ```text
//! {path_prefix}/{stem}-{size}x{size}.{ext}   # raster variants
//! {path_prefix}/{stem}-any.{ext}             # size 0 = vector pass-through
//! ```
//!
//! ## Determinism
//!
//! The document serializes with a fixed key order and entries in declared
//! order. Variant derivation runs in parallel, but results are collected in
//! plan order before serialization begins, so identical configuration always
//! produces identical bytes.

use crate::compile::normalize_public_path;
use crate::config::{
    EdgeSidePanelConfig, IconConfig, LaunchHandlerConfig, ManifestConfig,
    ProtocolHandlerConfig, PwaConfig, RelatedApplicationConfig, ScopeExtensionConfig,
    ScreenshotConfig, ShareTargetParams, UrlRef,
};
use crate::imaging::{BackendError, IconFormat, ImageBackend};
use crate::resolve::{ReferenceError, UrlResolver};
use crate::types::BuildOutput;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The manifest document plus the icon assets it references.
#[derive(Debug)]
pub struct ManifestAssets {
    /// Serialized manifest document (stable key ordering).
    pub document: Vec<u8>,
    /// Where the document should be written. `None` skips the write.
    pub public_url: Option<String>,
    /// Derived icon/screenshot variants, one per `(size, format)`.
    pub assets: Vec<BuildOutput>,
}

/// The web-app-manifest document. Field order is serialization order.
#[derive(Debug, Serialize)]
pub struct ManifestDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub display_override: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iarc_rating_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer_related_applications: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_applications: Vec<RelatedApplicationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_links: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_handler: Option<LaunchHandlerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_side_panel: Option<EdgeSidePanelConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope_extensions: Vec<ScopeExtensionConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocol_handlers: Vec<ProtocolHandlerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_target: Option<ShareTargetEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_handlers: Vec<FileHandlerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shortcuts: Vec<ShortcutEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<ScreenshotEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<WidgetEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconEntry>,
}

/// One icon as it appears in the document: derived URL, single size.
#[derive(Debug, Clone, Serialize)]
pub struct IconEntry {
    pub src: String,
    /// `"48x48"` or `"any"`.
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenshotEntry {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortcutEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconEntry>,
}

#[derive(Debug, Serialize)]
pub struct ShareTargetEntry {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enctype: Option<String>,
    pub params: ShareTargetParams,
}

#[derive(Debug, Serialize)]
pub struct FileHandlerEntry {
    pub action: String,
    pub accept: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct WidgetEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_ac_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<ScreenshotEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<u64>,
}

/// A single physical variant to derive: source on disk, target, public URL.
#[derive(Debug, Clone)]
struct VariantPlan {
    source: PathBuf,
    size: u32,
    format: IconFormat,
    public_url: String,
}

/// Build the manifest. Returns `None` when the feature is disabled or the
/// section is absent — in that case no image processing happens at all.
pub fn build(
    config: &PwaConfig,
    root: &Path,
    backend: &dyn ImageBackend,
    resolver: &dyn UrlResolver,
) -> Result<Option<ManifestAssets>, ManifestError> {
    let Some(manifest) = config.manifest.as_ref().filter(|m| m.enabled) else {
        return Ok(None);
    };

    let prefix = normalize_public_path(&config.path_prefix);
    let mut plans: Vec<VariantPlan> = Vec::new();

    let icons = plan_icon_entries(&manifest.icons, root, &prefix, &mut plans);
    let shortcuts = build_shortcuts(manifest, root, &prefix, resolver, &mut plans)?;
    let screenshots = build_screenshots(&manifest.screenshots, root, &prefix, resolver, &mut plans)?;
    let widgets = build_widgets(manifest, root, &prefix, resolver, &mut plans)?;
    let share_target = build_share_target(manifest, resolver)?;
    let file_handlers = build_file_handlers(manifest, resolver)?;

    // Distinct variants may collapse to the same URL (e.g. the same source
    // and size declared once per purpose). Keep the first occurrence.
    let mut seen = std::collections::BTreeSet::new();
    plans.retain(|p| seen.insert(p.public_url.clone()));

    // Derive variants in parallel; collection preserves plan order.
    let assets: Vec<BuildOutput> = plans
        .par_iter()
        .map(|plan| {
            backend
                .process(&plan.source, plan.size, plan.format)
                .map(|bytes| BuildOutput::new(plan.public_url.clone(), bytes))
        })
        .collect::<Result<_, BackendError>>()?;

    let document = ManifestDocument {
        name: manifest.name.clone(),
        short_name: manifest.short_name.clone(),
        description: manifest.description.clone(),
        lang: manifest.lang.clone(),
        dir: manifest.dir.clone(),
        id: manifest.id.clone(),
        start_url: manifest.start_url.clone(),
        scope: manifest.scope.clone(),
        display: manifest.display.clone(),
        display_override: manifest.display_override.clone(),
        orientation: manifest.orientation.clone(),
        background_color: manifest.background_color.clone(),
        theme_color: manifest.theme_color.clone(),
        categories: manifest.categories.clone(),
        iarc_rating_id: manifest.iarc_rating_id.clone(),
        prefer_related_applications: manifest.prefer_related_applications,
        related_applications: manifest.related_applications.clone(),
        handle_links: manifest.handle_links.clone(),
        launch_handler: manifest.launch_handler.clone(),
        edge_side_panel: manifest.edge_side_panel.clone(),
        scope_extensions: manifest.scope_extensions.clone(),
        protocol_handlers: manifest.protocol_handlers.clone(),
        share_target,
        file_handlers,
        shortcuts,
        screenshots,
        widgets,
        icons,
    };

    Ok(Some(ManifestAssets {
        document: serde_json::to_vec_pretty(&document)?,
        public_url: manifest.public_url.clone(),
        assets,
    }))
}

/// Expand one icon declaration into document entries and variant plans,
/// one per declared size.
fn plan_icon_entries(
    icons: &[IconConfig],
    root: &Path,
    prefix: &str,
    plans: &mut Vec<VariantPlan>,
) -> Vec<IconEntry> {
    let mut entries = Vec::new();
    for icon in icons {
        for &size in &icon.sizes {
            let format = effective_format(icon, size);
            let url = variant_url(prefix, &icon.src, size, format);
            plans.push(VariantPlan {
                source: root.join(&icon.src),
                size,
                format,
                public_url: url.clone(),
            });
            entries.push(IconEntry {
                src: url,
                sizes: sizes_attr(size),
                mime: variant_mime(&icon.src, size, format),
                purpose: icon.purpose.clone(),
            });
        }
    }
    entries
}

fn build_shortcuts(
    manifest: &ManifestConfig,
    root: &Path,
    prefix: &str,
    resolver: &dyn UrlResolver,
    plans: &mut Vec<VariantPlan>,
) -> Result<Vec<ShortcutEntry>, ManifestError> {
    let mut entries = Vec::new();
    for shortcut in &manifest.shortcuts {
        let icons: Vec<IconConfig> = shortcut.icons.iter().map(|i| i.to_icon()).collect();
        entries.push(ShortcutEntry {
            name: shortcut.name.clone(),
            short_name: shortcut.short_name.clone(),
            description: shortcut.description.clone(),
            url: resolve_url_ref(&shortcut.url, resolver)?,
            icons: plan_icon_entries(&icons, root, prefix, plans),
        });
    }
    Ok(entries)
}

fn build_screenshots(
    screenshots: &[ScreenshotConfig],
    root: &Path,
    prefix: &str,
    resolver: &dyn UrlResolver,
    plans: &mut Vec<VariantPlan>,
) -> Result<Vec<ScreenshotEntry>, ManifestError> {
    let mut entries = Vec::new();
    for shot in screenshots {
        if shot.sizes.is_empty() {
            // No derivation requested: reference the source as-is.
            let src = resolver
                .resolve_asset(&shot.src)
                .ok_or_else(|| ReferenceError::Asset(shot.src.clone()))?;
            entries.push(ScreenshotEntry {
                src,
                sizes: None,
                mime: None,
                label: shot.label.clone(),
                form_factor: shot.form_factor.clone(),
                platform: shot.platform.clone(),
            });
            continue;
        }
        for &size in &shot.sizes {
            let format = shot.format.unwrap_or(IconFormat::Png);
            let url = variant_url(prefix, &shot.src, size, format);
            plans.push(VariantPlan {
                source: root.join(&shot.src),
                size,
                format,
                public_url: url.clone(),
            });
            entries.push(ScreenshotEntry {
                src: url,
                sizes: Some(sizes_attr(size)),
                mime: Some(variant_mime(&shot.src, size, format)),
                label: shot.label.clone(),
                form_factor: shot.form_factor.clone(),
                platform: shot.platform.clone(),
            });
        }
    }
    Ok(entries)
}

fn build_widgets(
    manifest: &ManifestConfig,
    root: &Path,
    prefix: &str,
    resolver: &dyn UrlResolver,
    plans: &mut Vec<VariantPlan>,
) -> Result<Vec<WidgetEntry>, ManifestError> {
    let mut entries = Vec::new();
    for widget in &manifest.widgets {
        entries.push(WidgetEntry {
            name: widget.name.clone(),
            description: widget.description.clone(),
            tag: widget.tag.clone(),
            template: widget.template.clone(),
            ms_ac_template: widget.ms_ac_template.clone(),
            data: widget.data.clone(),
            data_type: widget.data_type.clone(),
            screenshots: build_screenshots(&widget.screenshots, root, prefix, resolver, plans)?,
            icons: plan_icon_entries(&widget.icons, root, prefix, plans),
            auth: widget.auth,
            update: widget.update,
        });
    }
    Ok(entries)
}

fn build_share_target(
    manifest: &ManifestConfig,
    resolver: &dyn UrlResolver,
) -> Result<Option<ShareTargetEntry>, ManifestError> {
    let Some(target) = &manifest.share_target else {
        return Ok(None);
    };
    Ok(Some(ShareTargetEntry {
        action: resolve_url_ref(&target.action, resolver)?,
        method: target.method.clone(),
        enctype: target.enctype.clone(),
        params: target.params.clone(),
    }))
}

fn build_file_handlers(
    manifest: &ManifestConfig,
    resolver: &dyn UrlResolver,
) -> Result<Vec<FileHandlerEntry>, ManifestError> {
    manifest
        .file_handlers
        .iter()
        .map(|handler| {
            Ok(FileHandlerEntry {
                action: resolve_url_ref(&handler.action, resolver)?,
                accept: handler.accept.clone(),
            })
        })
        .collect()
}

/// Resolve a literal-or-route URL. Literals pass through untouched.
fn resolve_url_ref(url: &UrlRef, resolver: &dyn UrlResolver) -> Result<String, ReferenceError> {
    match url {
        UrlRef::Literal(s) => Ok(s.clone()),
        UrlRef::Route(route) => resolver
            .resolve_route(&route.path, &route.params)
            .ok_or_else(|| ReferenceError::Route(route.path.clone())),
    }
}

/// Target format for a declared size. Size 0 keeps the source format
/// (pass-through), so the declared `type` is irrelevant there.
fn effective_format(icon: &IconConfig, size: u32) -> IconFormat {
    if size == 0 {
        IconFormat::Png // unused by pass-through naming; see variant_url
    } else {
        icon.format.unwrap_or(IconFormat::Png)
    }
}

fn sizes_attr(size: u32) -> String {
    if size == 0 {
        "any".to_string()
    } else {
        format!("{size}x{size}")
    }
}

fn source_extension(src: &str) -> &str {
    Path::new(src)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
}

fn variant_url(prefix: &str, src: &str, size: u32, format: IconFormat) -> String {
    let stem = Path::new(src)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("icon");
    if size == 0 {
        format!("{prefix}/{stem}-any.{}", source_extension(src))
    } else {
        format!("{prefix}/{stem}-{size}x{size}.{}", format.extension())
    }
}

fn variant_mime(src: &str, size: u32, format: IconFormat) -> String {
    if size == 0 {
        match source_extension(src).to_ascii_lowercase().as_str() {
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "webp" => "image/webp",
            "jpg" | "jpeg" => "image/jpeg",
            "ico" => "image/x-icon",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
        .to_string()
    } else {
        format.mime_type().to_string()
    }
}
