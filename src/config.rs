//! PWA configuration module.
//!
//! Handles loading and validating `pwa.toml`. The configuration is a nested
//! tree with three optional feature sections — `[favicons]`, `[manifest]`,
//! `[serviceworker]` — plus a handful of top-level knobs (backend selection,
//! public path prefix, worker count). An absent section means the feature is
//! disabled; a present section must carry its required source fields when
//! `enabled = true`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! image_backend = "raster"   # "raster" (resize/encode) or "none" (pass-through)
//! path_prefix = "/pwa"       # Public URL prefix for derived icon assets
//!
//! [processing]
//! max_workers = 4            # Max parallel workers (omit for auto = CPU cores)
//!
//! [favicons]
//! enabled = true
//! src = "assets/icon.png"    # Large PNG (SVG needs image_backend = "none")
//! public_prefix = ""         # "" = site root (/favicon-32x32.png)
//! sizes = [16, 32, 48, 180, 192, 512]
//! ico = true                 # Also emit favicon.ico
//!
//! [manifest]
//! enabled = true
//! public_url = "/site.webmanifest"
//! name = "My App"
//! display = "standalone"
//!
//! [[manifest.icons]]
//! src = "assets/icon.png"
//! sizes = [48, 96, 192]      # 0 = "any" (vector source passed through)
//! type = "webp"
//!
//! [serviceworker]
//! enabled = true
//! src = "assets/sw.js"
//! public_url = "/sw.js"
//! scope = "/"
//! use_cache = true
//!
//! [[serviceworker.workbox.resource_caches]]
//! match_callback = "regex:.*"
//! strategy = "StaleWhileRevalidate"
//! cache_name = "pages"
//! preload_urls = ["/", "@widgets"]
//! ```
//!
//! ## Validation
//!
//! Validation is purely structural — no I/O. Every failure names the
//! offending path (`manifest.icons[2].sizes`) and a human-readable reason.
//! Unknown keys are rejected to catch typos early. Normalization (applying
//! defaults while deserializing) is idempotent: re-resolving an already
//! normalized tree yields the same tree.

use crate::imaging::IconFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration at `{path}`: {reason}")]
    Validation { path: String, reason: String },
}

impl ConfigError {
    fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Enumerated value sets from the web-app-manifest spec.
pub const DISPLAY_MODES: &[&str] = &["fullscreen", "standalone", "minimal-ui", "browser"];
pub const ORIENTATIONS: &[&str] = &[
    "any",
    "natural",
    "landscape",
    "landscape-primary",
    "landscape-secondary",
    "portrait",
    "portrait-primary",
    "portrait-secondary",
];
pub const TEXT_DIRECTIONS: &[&str] = &["ltr", "rtl", "auto"];
pub const ICON_PURPOSES: &[&str] = &["any", "maskable", "monochrome"];
pub const HANDLE_LINKS: &[&str] = &["auto", "preferred", "not-preferred"];
pub const CLIENT_MODES: &[&str] = &["auto", "focus-existing", "navigate-new", "navigate-existing"];
pub const SHARE_METHODS: &[&str] = &["GET", "POST"];

/// Root configuration tree.
///
/// All fields have defaults; feature sections are absent-means-disabled.
/// Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PwaConfig {
    /// Image backend selection: resolved to a concrete backend at
    /// composition time, never by runtime reflection.
    pub image_backend: BackendKind,
    /// Public URL prefix for derived icon assets (manifest icons,
    /// screenshots). Normalized to a single leading slash at write time.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Favicon set generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicons: Option<FaviconsConfig>,
    /// Web manifest generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestConfig>,
    /// Service worker generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serviceworker: Option<ServiceWorkerConfig>,
}

/// Backend selection key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Decode, resize, and re-encode through the `image` crate.
    #[default]
    Raster,
    /// Pass sources through unmodified. For SVG-only deployments and tests.
    None,
}

fn default_path_prefix() -> String {
    "/pwa".to_string()
}

impl PwaConfig {
    pub fn favicons_enabled(&self) -> bool {
        self.favicons.as_ref().is_some_and(|f| f.enabled)
    }

    pub fn manifest_enabled(&self) -> bool {
        self.manifest.as_ref().is_some_and(|m| m.enabled)
    }

    pub fn serviceworker_enabled(&self) -> bool {
        self.serviceworker.as_ref().is_some_and(|sw| sw.enabled)
    }

    /// Validate the tree. Purely structural — no I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(favicons) = &self.favicons {
            favicons.validate()?;
        }
        if let Some(manifest) = &self.manifest {
            manifest.validate()?;
        }
        if let Some(sw) = &self.serviceworker {
            sw.validate()?;
        }
        Ok(())
    }
}

// The derived `Default` leaves `path_prefix` empty; `new()` is the
// constructor that matches what deserializing an empty file produces.
impl PwaConfig {
    pub fn new() -> Self {
        Self {
            path_prefix: default_path_prefix(),
            ..Self::default()
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_workers(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Favicons
// =============================================================================

/// Favicon set generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaviconsConfig {
    pub enabled: bool,
    /// Source image. Shall be an SVG or large PNG. Required when enabled.
    pub src: String,
    /// Public URL prefix for the set. Empty = site root.
    pub public_prefix: String,
    /// Pixel sizes to derive. 180 becomes `apple-touch-icon.png`,
    /// 192/512 become `icon-{n}.png`, the rest `favicon-{n}x{n}.png`.
    pub sizes: Vec<u32>,
    /// Also emit a `favicon.ico` (from the smallest size ≥ 32, if any).
    pub ico: bool,
}

impl Default for FaviconsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            src: String::new(),
            public_prefix: String::new(),
            sizes: vec![16, 32, 48, 180, 192, 512],
            ico: true,
        }
    }
}

impl FaviconsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.src.is_empty() {
            return Err(ConfigError::invalid(
                "favicons.src",
                "required when the section is enabled; shall be an SVG or large PNG",
            ));
        }
        if self.sizes.is_empty() {
            return Err(ConfigError::invalid("favicons.sizes", "must not be empty"));
        }
        if let Some(pos) = self.sizes.iter().position(|s| *s == 0) {
            return Err(ConfigError::invalid(
                format!("favicons.sizes[{pos}]"),
                "favicon sizes must be positive",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// Web manifest settings, mirroring the standard key set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub enabled: bool,
    /// Public URL of the manifest document. `None` skips the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Text direction: `ltr`, `rtl`, or `auto`.
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
    /// `auto`, `preferred`, or `not-preferred`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_links: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_handler: Option<LaunchHandlerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_side_panel: Option<EdgeSidePanelConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope_extensions: Vec<ScopeExtensionConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shortcuts: Vec<ShortcutConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<ScreenshotConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_target: Option<ShareTargetConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocol_handlers: Vec<ProtocolHandlerConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_handlers: Vec<FileHandlerConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<WidgetConfig>,
}

fn default_manifest_public_url() -> Option<String> {
    Some("/site.webmanifest".to_string())
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            public_url: default_manifest_public_url(),
            name: None,
            short_name: None,
            description: None,
            lang: None,
            dir: None,
            id: None,
            start_url: None,
            scope: None,
            display: None,
            display_override: Vec::new(),
            orientation: None,
            background_color: None,
            theme_color: None,
            categories: Vec::new(),
            iarc_rating_id: None,
            prefer_related_applications: None,
            related_applications: Vec::new(),
            handle_links: None,
            launch_handler: None,
            edge_side_panel: None,
            scope_extensions: Vec::new(),
            icons: Vec::new(),
            shortcuts: Vec::new(),
            screenshots: Vec::new(),
            share_target: None,
            protocol_handlers: Vec::new(),
            file_handlers: Vec::new(),
            widgets: Vec::new(),
        }
    }
}

impl ManifestConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        check_choice("manifest.display", self.display.as_deref(), DISPLAY_MODES)?;
        for (i, mode) in self.display_override.iter().enumerate() {
            check_choice(
                format!("manifest.display_override[{i}]"),
                Some(mode.as_str()),
                DISPLAY_MODES,
            )?;
        }
        check_choice(
            "manifest.orientation",
            self.orientation.as_deref(),
            ORIENTATIONS,
        )?;
        check_choice("manifest.dir", self.dir.as_deref(), TEXT_DIRECTIONS)?;
        check_choice(
            "manifest.handle_links",
            self.handle_links.as_deref(),
            HANDLE_LINKS,
        )?;
        if let Some(handler) = &self.launch_handler {
            for (i, mode) in handler.client_mode.iter().enumerate() {
                check_choice(
                    format!("manifest.launch_handler.client_mode[{i}]"),
                    Some(mode.as_str()),
                    CLIENT_MODES,
                )?;
            }
        }
        for (i, icon) in self.icons.iter().enumerate() {
            icon.validate(&format!("manifest.icons[{i}]"))?;
        }
        for (i, shortcut) in self.shortcuts.iter().enumerate() {
            shortcut.validate(&format!("manifest.shortcuts[{i}]"))?;
        }
        for (i, shot) in self.screenshots.iter().enumerate() {
            shot.validate(&format!("manifest.screenshots[{i}]"))?;
        }
        if let Some(target) = &self.share_target {
            target.validate("manifest.share_target")?;
        }
        for (i, handler) in self.protocol_handlers.iter().enumerate() {
            handler.validate(&format!("manifest.protocol_handlers[{i}]"))?;
        }
        for (i, app) in self.related_applications.iter().enumerate() {
            app.validate(&format!("manifest.related_applications[{i}]"))?;
        }
        for (i, handler) in self.file_handlers.iter().enumerate() {
            handler.validate(&format!("manifest.file_handlers[{i}]"))?;
        }
        for (i, widget) in self.widgets.iter().enumerate() {
            widget.validate(&format!("manifest.widgets[{i}]"))?;
        }
        for (i, ext) in self.scope_extensions.iter().enumerate() {
            if ext.origin.is_empty() {
                return Err(ConfigError::invalid(
                    format!("manifest.scope_extensions[{i}].origin"),
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// An icon declaration: one source, many physical variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconConfig {
    /// Source image. Required.
    pub src: String,
    /// Square pixel sizes to derive. `0` = "any size" (vector pass-through).
    pub sizes: Vec<u32>,
    /// Target encoding. Defaults to PNG; ignored for size `0` entries,
    /// which keep the source format.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub format: Option<IconFormat>,
    /// `any`, `maskable`, or `monochrome`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl IconConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.src.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.src"),
                "required: the source of the icon",
            ));
        }
        if self.sizes.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.sizes"),
                "must declare at least one size (0 = any)",
            ));
        }
        check_choice(
            format!("{path}.purpose"),
            self.purpose.as_deref(),
            ICON_PURPOSES,
        )?;
        Ok(())
    }
}

/// Shortcut icons accept a bare source path as shorthand for a full entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IconRef {
    Src(String),
    Icon(IconConfig),
}

impl IconRef {
    /// Normalize the shorthand to the icon schema. Bare paths become
    /// pass-through entries (`sizes = [0]`).
    pub fn to_icon(&self) -> IconConfig {
        match self {
            Self::Src(src) => IconConfig {
                src: src.clone(),
                sizes: vec![0],
                format: None,
                purpose: None,
            },
            Self::Icon(icon) => icon.clone(),
        }
    }
}

/// A URL that is either literal or a named route reference resolved at
/// build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlRef {
    Literal(String),
    Route(RouteRef),
}

impl Default for UrlRef {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl UrlRef {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        let empty = match self {
            Self::Literal(url) => url.is_empty(),
            Self::Route(route) => route.path.is_empty(),
        };
        if empty {
            return Err(ConfigError::invalid(path, "must not be empty"));
        }
        Ok(())
    }
}

/// A named route plus its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteRef {
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortcutConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: UrlRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconRef>,
}

impl ShortcutConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.name"),
                "must not be empty",
            ));
        }
        self.url.validate(&format!("{path}.url"))?;
        for (i, icon) in self.icons.iter().enumerate() {
            icon.to_icon().validate(&format!("{path}.icons[{i}]"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotConfig {
    pub src: String,
    /// When non-empty, physical variants are derived like icons.
    /// When empty, the source is referenced as-is.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub format: Option<IconFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `narrow` or `wide`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ScreenshotConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.src.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.src"),
                "required: the source of the screenshot",
            ));
        }
        check_choice(
            format!("{path}.form_factor"),
            self.form_factor.as_deref(),
            &["narrow", "wide"],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShareTargetConfig {
    pub action: UrlRef,
    /// `GET` or `POST`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enctype: Option<String>,
    pub params: ShareTargetParams,
}

impl ShareTargetConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        self.action.validate(&format!("{path}.action"))?;
        check_choice(
            format!("{path}.method"),
            self.method.as_deref(),
            SHARE_METHODS,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShareTargetParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolHandlerConfig {
    pub protocol: String,
    /// Must contain a `%s` placeholder for the handed-off URL.
    pub url: String,
}

impl ProtocolHandlerConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.protocol.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.protocol"),
                "must not be empty",
            ));
        }
        if !self.url.contains("%s") {
            return Err(ConfigError::invalid(
                format!("{path}.url"),
                "must contain a `%s` placeholder",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelatedApplicationConfig {
    pub platform: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RelatedApplicationConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.platform.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.platform"),
                "must not be empty",
            ));
        }
        if self.url.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.url"),
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchHandlerConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub client_mode: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeSidePanelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeExtensionConfig {
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileHandlerConfig {
    pub action: UrlRef,
    /// MIME type → accepted file extensions.
    pub accept: BTreeMap<String, Vec<String>>,
}

impl FileHandlerConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        self.action.validate(&format!("{path}.action"))?;
        if self.accept.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.accept"),
                "must map at least one MIME type",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WidgetConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_ac_template: Option<String>,
    /// Widget data URL. Feeds the `@widgets` preload group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<ScreenshotConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<bool>,
    /// Update frequency in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<u64>,
}

impl WidgetConfig {
    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid(
                format!("{path}.name"),
                "must not be empty",
            ));
        }
        for (i, icon) in self.icons.iter().enumerate() {
            icon.validate(&format!("{path}.icons[{i}]"))?;
        }
        for (i, shot) in self.screenshots.iter().enumerate() {
            shot.validate(&format!("{path}.screenshots[{i}]"))?;
        }
        Ok(())
    }
}

// =============================================================================
// Service worker
// =============================================================================

/// Service worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceWorkerConfig {
    pub enabled: bool,
    /// Path to the user-supplied source script. Required when enabled.
    pub src: String,
    /// Public URL of the generated script. `None` skips the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Registration scope.
    pub scope: String,
    /// Whether the browser may serve the script from its HTTP cache
    /// (`updateViaCache` in the registration snippet).
    pub use_cache: bool,
    pub workbox: WorkboxConfig,
}

impl Default for ServiceWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            src: String::new(),
            public_url: None,
            scope: "/".to_string(),
            use_cache: true,
            workbox: WorkboxConfig::default(),
        }
    }
}

impl ServiceWorkerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.src.is_empty() {
            return Err(ConfigError::invalid(
                "serviceworker.src",
                "required when the section is enabled",
            ));
        }
        if self.scope.is_empty() {
            return Err(ConfigError::invalid(
                "serviceworker.scope",
                "must not be empty",
            ));
        }
        self.workbox.validate()
    }
}

/// Caching-strategy configuration rendered into the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkboxConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_caches: Vec<ResourceCacheConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_fallback: Option<OfflineFallbackConfig>,
}

impl Default for WorkboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resource_caches: Vec::new(),
            offline_fallback: None,
        }
    }
}

impl WorkboxConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        for (i, cache) in self.resource_caches.iter().enumerate() {
            if cache.match_callback.is_empty() {
                return Err(ConfigError::invalid(
                    format!("serviceworker.workbox.resource_caches[{i}].match_callback"),
                    "must not be empty",
                ));
            }
        }
        if let Some(fallback) = &self.offline_fallback
            && fallback.page.is_empty()
        {
            return Err(ConfigError::invalid(
                "serviceworker.workbox.offline_fallback.page",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// One resource-cache rule: which requests match, which strategy serves
/// them, and which URLs to warm at install time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceCacheConfig {
    /// `regex:<pattern>`, `navigate`, or a URL path prefix.
    pub match_callback: String,
    pub strategy: CacheStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_name: Option<String>,
    /// Emit a broadcast-update plugin for this cache.
    pub broadcast: bool,
    /// Literal URLs, or `@group` tokens expanded at build time.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preload_urls: Vec<String>,
}

impl Default for ResourceCacheConfig {
    fn default() -> Self {
        Self {
            match_callback: String::new(),
            strategy: CacheStrategy::default(),
            cache_name: None,
            broadcast: false,
            preload_urls: Vec::new(),
        }
    }
}

/// Named caching policy, workbox vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStrategy {
    CacheFirst,
    CacheOnly,
    NetworkFirst,
    NetworkOnly,
    #[default]
    StaleWhileRevalidate,
}

impl CacheStrategy {
    /// The `workbox.strategies` constructor name.
    pub fn constructor(self) -> &'static str {
        match self {
            Self::CacheFirst => "CacheFirst",
            Self::CacheOnly => "CacheOnly",
            Self::NetworkFirst => "NetworkFirst",
            Self::NetworkOnly => "NetworkOnly",
            Self::StaleWhileRevalidate => "StaleWhileRevalidate",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfflineFallbackConfig {
    pub page: String,
}

// =============================================================================
// Loading and resolving
// =============================================================================

fn check_choice(
    path: impl Into<String>,
    value: Option<&str>,
    allowed: &[&str],
) -> Result<(), ConfigError> {
    match value {
        Some(v) if !allowed.contains(&v) => Err(ConfigError::invalid(
            path,
            format!("`{v}` is not one of {}", allowed.join(", ")),
        )),
        _ => Ok(()),
    }
}

/// Deserialize and validate an already-parsed configuration tree.
///
/// This is the entry point for hosts that parse their own config files.
pub fn resolve_config(value: toml::Value) -> Result<PwaConfig, ConfigError> {
    let mut config: PwaConfig = value.try_into()?;
    if config.path_prefix.is_empty() {
        config.path_prefix = default_path_prefix();
    }
    config.validate()?;
    Ok(config)
}

/// Load `pwa.toml` from the given directory.
///
/// Returns the (all-disabled) default configuration when no file exists.
/// Rejects unknown keys and validates the result.
pub fn load_config(root: &Path) -> Result<PwaConfig, ConfigError> {
    let config_path = root.join("pwa.toml");
    if !config_path.exists() {
        return Ok(PwaConfig::new());
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(value)
}

/// Returns a fully-commented stock `pwa.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pwa-press Configuration
# =======================
# All settings are optional. A missing section disables that feature.
# Unknown keys will cause an error.

# Image backend: "raster" resizes and re-encodes through pure-Rust codecs,
# "none" passes every source through unmodified (SVG-only deployments).
image_backend = "raster"

# Public URL prefix for derived icon assets.
path_prefix = "/pwa"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_workers = 4

# ---------------------------------------------------------------------------
# Favicons - a standard set derived from one source image
# ---------------------------------------------------------------------------
[favicons]
enabled = true
src = "assets/icon.png"          # Large PNG (SVG needs image_backend = "none")
public_prefix = ""               # "" = site root
sizes = [16, 32, 48, 180, 192, 512]
ico = true                       # Also emit favicon.ico

# ---------------------------------------------------------------------------
# Web manifest
# ---------------------------------------------------------------------------
[manifest]
enabled = true
public_url = "/site.webmanifest"
name = "My Application"
short_name = "MyApp"
start_url = "/"
scope = "/"
display = "standalone"           # fullscreen | standalone | minimal-ui | browser
background_color = "#ffffff"
theme_color = "#0a0a0a"

# One physical asset is derived per (size, type) combination.
[[manifest.icons]]
src = "assets/icon.png"
sizes = [48, 96, 192, 512]
type = "png"                     # png | webp | jpeg | ico

[[manifest.icons]]
src = "assets/icon.svg"
sizes = [0]                      # 0 = "any": vector source passed through

[[manifest.shortcuts]]
name = "New entry"
url = "/create"                  # or { path = "route_name", params = { ... } }

# ---------------------------------------------------------------------------
# Service worker
# ---------------------------------------------------------------------------
[serviceworker]
enabled = true
src = "assets/sw.js"             # User script, appended after generated rules
public_url = "/sw.js"            # Omit to build without writing
scope = "/"
use_cache = true

[[serviceworker.workbox.resource_caches]]
match_callback = "regex:.*"      # regex:<pattern> | navigate | URL prefix
strategy = "StaleWhileRevalidate"
cache_name = "pages"
broadcast = false
preload_urls = ["/", "@widgets"] # Literals, or @group tokens expanded at build
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(toml_str: &str) -> PwaConfig {
        resolve_config(toml::from_str(toml_str).unwrap()).unwrap()
    }

    // =========================================================================
    // Defaults and sections
    // =========================================================================

    #[test]
    fn empty_config_disables_all_features() {
        let config = parse("");
        assert!(!config.favicons_enabled());
        assert!(!config.manifest_enabled());
        assert!(!config.serviceworker_enabled());
        assert_eq!(config.path_prefix, "/pwa");
        assert_eq!(config.image_backend, BackendKind::Raster);
    }

    #[test]
    fn present_but_disabled_section_is_disabled() {
        let config = parse(
            r#"
[manifest]
enabled = false
name = "x"
"#,
        );
        assert!(!config.manifest_enabled());
        assert!(config.manifest.is_some());
    }

    #[test]
    fn favicons_only() {
        let config = parse(
            r#"
[favicons]
enabled = true
src = "pwa/1920x1920.svg"
"#,
        );
        assert!(config.favicons_enabled());
        let favicons = config.favicons.unwrap();
        assert_eq!(favicons.src, "pwa/1920x1920.svg");
        assert_eq!(favicons.sizes, vec![16, 32, 48, 180, 192, 512]);
        assert!(favicons.ico);
    }

    #[test]
    fn manifest_public_url_defaults() {
        let config = parse(
            r#"
[manifest]
enabled = true
"#,
        );
        assert_eq!(
            config.manifest.unwrap().public_url.as_deref(),
            Some("/site.webmanifest")
        );
    }

    #[test]
    fn serviceworker_defaults() {
        let config = parse(
            r#"
[serviceworker]
enabled = true
src = "sw.js"
"#,
        );
        let sw = config.serviceworker.unwrap();
        assert_eq!(sw.scope, "/");
        assert!(sw.use_cache);
        assert!(sw.public_url.is_none());
        assert!(sw.workbox.enabled);
    }

    #[test]
    fn backend_kind_none() {
        let config = parse(r#"image_backend = "none""#);
        assert_eq!(config.image_backend, BackendKind::None);
    }

    // =========================================================================
    // Unknown key rejection
    // =========================================================================

    #[test]
    fn unknown_root_key_rejected() {
        let result: Result<PwaConfig, _> = toml::from_str(r#"pathprefix = "/x""#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_key_rejected() {
        let result: Result<PwaConfig, _> = toml::from_str(
            r#"
[favicons]
enabled = true
sorce = "a.svg"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_icon_key_rejected() {
        let result: Result<PwaConfig, _> = toml::from_str(
            r#"
[manifest]
enabled = true

[[manifest.icons]]
src = "a.svg"
sizs = [48]
"#,
        );
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation: required-child-when-enabled
    // =========================================================================

    #[test]
    fn favicons_enabled_without_src_is_error() {
        let value: toml::Value = toml::from_str(
            r#"
[favicons]
enabled = true
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err();
        match err {
            ConfigError::Validation { path, .. } => assert_eq!(path, "favicons.src"),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn favicons_disabled_without_src_is_fine() {
        let config = parse("[favicons]\nenabled = false\n");
        assert!(!config.favicons_enabled());
    }

    #[test]
    fn serviceworker_enabled_without_src_is_error() {
        let value: toml::Value = toml::from_str(
            r#"
[serviceworker]
enabled = true
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err();
        match err {
            ConfigError::Validation { path, .. } => assert_eq!(path, "serviceworker.src"),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn icon_without_sizes_is_error() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true

[[manifest.icons]]
src = "a.svg"
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err().to_string();
        assert!(err.contains("manifest.icons[0].sizes"), "got: {err}");
    }

    #[test]
    fn second_icon_error_names_its_index() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true

[[manifest.icons]]
src = "a.svg"
sizes = [48]

[[manifest.icons]]
sizes = [96]
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err().to_string();
        assert!(err.contains("manifest.icons[1].src"), "got: {err}");
    }

    // =========================================================================
    // Validation: enumerated values
    // =========================================================================

    #[test]
    fn invalid_display_mode_rejected() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true
display = "windowed"
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err().to_string();
        assert!(err.contains("manifest.display"), "got: {err}");
        assert!(err.contains("windowed"), "got: {err}");
    }

    #[test]
    fn valid_display_modes_accepted() {
        for mode in DISPLAY_MODES {
            let config = parse(&format!(
                "[manifest]\nenabled = true\ndisplay = \"{mode}\"\n"
            ));
            assert_eq!(config.manifest.unwrap().display.as_deref(), Some(*mode));
        }
    }

    #[test]
    fn invalid_orientation_rejected() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true
orientation = "sideways"
"#,
        )
        .unwrap();
        assert!(resolve_config(value).is_err());
    }

    #[test]
    fn invalid_icon_purpose_rejected() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true

[[manifest.icons]]
src = "a.svg"
sizes = [48]
purpose = "decorative"
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err().to_string();
        assert!(err.contains("manifest.icons[0].purpose"), "got: {err}");
    }

    #[test]
    fn invalid_client_mode_rejected() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true

[manifest.launch_handler]
client_mode = ["focus-existing", "jump"]
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err().to_string();
        assert!(err.contains("client_mode[1]"), "got: {err}");
    }

    #[test]
    fn protocol_handler_requires_placeholder() {
        let value: toml::Value = toml::from_str(
            r#"
[manifest]
enabled = true

[[manifest.protocol_handlers]]
protocol = "web+jngl"
url = "/lookup"
"#,
        )
        .unwrap();
        let err = resolve_config(value).unwrap_err().to_string();
        assert!(err.contains("%s"), "got: {err}");
    }

    #[test]
    fn disabled_section_skips_validation() {
        // An invalid display mode inside a disabled manifest is not reported.
        let config = parse(
            r#"
[manifest]
enabled = false
display = "windowed"
"#,
        );
        assert!(!config.manifest_enabled());
    }

    // =========================================================================
    // Shorthand forms
    // =========================================================================

    #[test]
    fn shortcut_icon_shorthand_parses() {
        let config = parse(
            r#"
[manifest]
enabled = true

[[manifest.shortcuts]]
name = "New reminder"
url = "/create/reminder"
icons = ["pwa/1920x1920.svg"]
"#,
        );
        let manifest = config.manifest.unwrap();
        let icon = manifest.shortcuts[0].icons[0].to_icon();
        assert_eq!(icon.src, "pwa/1920x1920.svg");
        assert_eq!(icon.sizes, vec![0]);
    }

    #[test]
    fn shortcut_icon_full_form_parses() {
        let config = parse(
            r#"
[manifest]
enabled = true

[[manifest.shortcuts]]
name = "New reminder"
url = "/create/reminder"

[[manifest.shortcuts.icons]]
src = "pwa/1920x1920.svg"
sizes = [96]
purpose = "maskable"
"#,
        );
        let manifest = config.manifest.unwrap();
        let icon = manifest.shortcuts[0].icons[0].to_icon();
        assert_eq!(icon.sizes, vec![96]);
        assert_eq!(icon.purpose.as_deref(), Some("maskable"));
    }

    #[test]
    fn shortcut_url_route_form_parses() {
        let config = parse(
            r#"
[manifest]
enabled = true

[[manifest.shortcuts]]
name = "Today's agenda"
url = { path = "agenda", params = { date = "today" } }
"#,
        );
        let manifest = config.manifest.unwrap();
        match &manifest.shortcuts[0].url {
            UrlRef::Route(route) => {
                assert_eq!(route.path, "agenda");
                assert_eq!(route.params.get("date").map(String::as_str), Some("today"));
            }
            other => panic!("expected route ref, got {other:?}"),
        }
    }

    // =========================================================================
    // Complete configuration
    // =========================================================================

    #[test]
    fn complete_configuration_is_valid() {
        let config = parse(
            r#"
image_backend = "none"

[favicons]
enabled = true
src = "pwa/1920x1920.svg"

[manifest]
enabled = true
name = "pwa.name"
short_name = "pwa.short_name"
description = "pwa.description"
lang = "ar"
dir = "rtl"
id = "/?homescreen=1"
start_url = "/"
scope = "/"
display = "standalone"
display_override = ["fullscreen", "minimal-ui"]
orientation = "portrait-primary"
background_color = "red"
theme_color = "red"
categories = ["productivity", "utilities"]
iarc_rating_id = "123456"
prefer_related_applications = true
handle_links = "auto"

[manifest.launch_handler]
client_mode = ["focus-existing", "auto"]

[manifest.edge_side_panel]
preferred_width = 480

[[manifest.scope_extensions]]
origin = "*.foo.com"

[[manifest.icons]]
src = "pwa/1920x1920.svg"
sizes = [48, 72, 96, 128, 256]
type = "webp"

[[manifest.icons]]
src = "pwa/1920x1920.svg"
sizes = [48, 72]
type = "png"
purpose = "maskable"

[[manifest.icons]]
src = "pwa/1920x1920.svg"
sizes = [0]

[[manifest.screenshots]]
src = "pwa/screenshots/360x800.svg"
label = "pwa.screenshots.0"

[manifest.share_target]
action = { path = "shared_content_receiver" }
method = "GET"
params = { title = "name", text = "description", url = "link" }

[[manifest.protocol_handlers]]
protocol = "web+jngl"
url = "/lookup?type=%s"

[[manifest.related_applications]]
platform = "play"
url = "https://play.google.com/store/apps/details?id=com.example.app1"
id = "com.example.app1"

[[manifest.file_handlers]]
action = "/audio"
accept = { "audio/wav" = [".wav"], "audio/mpeg" = [".mp3"] }

[[manifest.widgets]]
name = "PWAmp mini player"
description = "widget to control the PWAmp music player"
tag = "pwamp"
template = "pwamp-template"
ms_ac_template = "app_widget_template"
data = "/widgets/pwamp.json"
type = "application/json"
auth = false
update = 86400

[[manifest.widgets.icons]]
src = "pwa/1920x1920.svg"
sizes = [16, 48]
type = "webp"

[serviceworker]
enabled = true
src = "sw.js"
scope = "/"
use_cache = true

[[serviceworker.workbox.resource_caches]]
match_callback = "regex:.*"
strategy = "StaleWhileRevalidate"
cache_name = "page-cache"
broadcast = true
preload_urls = ["/privacy", "/terms", "@static-pages", "@widgets"]

[serviceworker.workbox.offline_fallback]
page = "/offline.html"
"#,
        );
        assert!(config.favicons_enabled());
        assert!(config.manifest_enabled());
        assert!(config.serviceworker_enabled());

        let manifest = config.manifest.as_ref().unwrap();
        assert_eq!(manifest.icons.len(), 3);
        assert_eq!(manifest.icons[0].format, Some(IconFormat::Webp));
        assert_eq!(manifest.icons[2].sizes, vec![0]);
        assert_eq!(manifest.widgets[0].update, Some(86400));

        let sw = config.serviceworker.as_ref().unwrap();
        let cache = &sw.workbox.resource_caches[0];
        assert_eq!(cache.strategy, CacheStrategy::StaleWhileRevalidate);
        assert!(cache.broadcast);
        assert_eq!(cache.preload_urls.len(), 4);
    }

    // =========================================================================
    // Normalization idempotency
    // =========================================================================

    #[test]
    fn normalization_is_idempotent() {
        let config = parse(
            r#"
[favicons]
enabled = true
src = "icon.svg"

[manifest]
enabled = true
name = "x"

[[manifest.icons]]
src = "icon.svg"
sizes = [48, 72]
type = "webp"
"#,
        );
        let reserialized = toml::Value::try_from(&config).unwrap();
        let renormalized = resolve_config(reserialized).unwrap();
        assert_eq!(config, renormalized);
    }

    // =========================================================================
    // load_config
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert!(!config.manifest_enabled());
        assert_eq!(config.path_prefix, "/pwa");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("pwa.toml"),
            r#"
[manifest]
enabled = true
name = "From disk"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert!(config.manifest_enabled());
        assert_eq!(
            config.manifest.unwrap().name.as_deref(),
            Some("From disk")
        );
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pwa.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("pwa.toml"),
            r#"
[favicons]
enabled = true
"#,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    // =========================================================================
    // Worker count resolution
    // =========================================================================

    #[test]
    fn effective_workers_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_workers(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_workers_clamped_to_cores() {
        let config = ProcessingConfig {
            max_workers: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_workers(&config), cores);
    }

    #[test]
    fn effective_workers_user_constrains_down() {
        let config = ProcessingConfig {
            max_workers: Some(1),
        };
        assert_eq!(effective_workers(&config), 1);
    }

    // =========================================================================
    // stock_config_toml
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_and_validates() {
        let content = stock_config_toml();
        let value: toml::Value = toml::from_str(content).expect("stock config must be valid TOML");
        let config = resolve_config(value).expect("stock config must validate");
        assert!(config.favicons_enabled());
        assert!(config.manifest_enabled());
        assert!(config.serviceworker_enabled());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("[processing]"));
        assert!(content.contains("[favicons]"));
        assert!(content.contains("[manifest]"));
        assert!(content.contains("[[manifest.icons]]"));
        assert!(content.contains("[serviceworker]"));
        assert!(content.contains("[[serviceworker.workbox.resource_caches]]"));
    }
}
