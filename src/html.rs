//! HTML head snippet rendering.
//!
//! Hosts embed the generated artifacts by dropping one markup block into
//! their `<head>`: the manifest link, theme-color meta, favicon links, and
//! an inline service-worker registration script. Rendered with
//! [maud](https://maud.lambda.xyz/) — type-safe, auto-escaped, no template
//! files to ship.
//!
//! This snippet is a pure function of configuration; the compile pass does
//! not write it anywhere.

use crate::config::PwaConfig;
use crate::favicons::{self, FaviconVariant};
use crate::imaging::IconFormat;
use crate::serviceworker::js_str;
use maud::{Markup, PreEscaped, html};

/// Render everything the host's `<head>` needs.
pub fn render_head(config: &PwaConfig) -> Markup {
    html! {
        @if let Some(manifest) = config.manifest.as_ref().filter(|m| m.enabled) {
            @if let Some(url) = manifest.public_url.as_ref().filter(|u| !u.is_empty()) {
                link rel="manifest" href=(url);
            }
            @if let Some(color) = &manifest.theme_color {
                meta name="theme-color" content=(color);
            }
        }
        @if let Some(favicons) = config.favicons.as_ref().filter(|f| f.enabled) {
            @for variant in favicons::plan_set(favicons) {
                (favicon_link(&variant))
            }
        }
        @if let Some(script) = registration_script(config) {
            script { (PreEscaped(script)) }
        }
    }
}

fn favicon_link(variant: &FaviconVariant) -> Markup {
    html! {
        @if variant.size == 180 {
            link rel="apple-touch-icon" sizes="180x180" href=(variant.public_url);
        } @else if variant.format == IconFormat::Ico {
            link rel="icon" href=(variant.public_url);
        } @else {
            link rel="icon" type=(variant.format.mime_type())
                sizes=(format!("{0}x{0}", variant.size)) href=(variant.public_url);
        }
    }
}

/// The inline registration script, honoring scope and `use_cache`.
/// `None` when the service worker is disabled or has no public URL.
fn registration_script(config: &PwaConfig) -> Option<String> {
    let sw = config.serviceworker.as_ref().filter(|s| s.enabled)?;
    let url = sw.public_url.as_ref().filter(|u| !u.is_empty())?;
    let update_via_cache = if sw.use_cache { "all" } else { "none" };
    Some(format!(
        "if (\"serviceWorker\" in navigator) {{\n  navigator.serviceWorker.register({}, {{ scope: {}, updateViaCache: {} }});\n}}",
        js_str(url),
        js_str(&sw.scope),
        js_str(update_via_cache),
    ))
}
