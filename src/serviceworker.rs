//! Service worker assembly.
//!
//! Produces the final service-worker script: a generated caching-rules
//! block followed by the user-supplied source script, verbatim. The
//! generated block registers one workbox route per configured resource
//! cache, warms its preload URLs at install time, and optionally wires an
//! offline fallback page.
//!
//! ## Symbolic preload URLs
//!
//! `preload_urls` entries starting with `@` name a URL group resolved at
//! build time through the [`PreloadGroups`] capability (`@widgets` is
//! provided from the configuration itself by the compile pass). After
//! expansion, duplicate URLs are dropped by first occurrence.
//!
//! ## Cache versioning
//!
//! Cache names carry a version suffix derived from a SHA-256 of the
//! expanded caching rules. Identical configuration yields identical output;
//! changing a rule rolls every cache name, so stale caches die on the next
//! activation. No timestamps or random identifiers are embedded.

use crate::config::{PwaConfig, ServiceWorkerConfig};
use crate::resolve::{PreloadGroups, ReferenceError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceWorkerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Preload URLs contributed by the configuration itself: `@widgets`
/// expands to every widget's `data` URL, in declared order.
pub fn widget_preload_urls(config: &PwaConfig) -> Vec<String> {
    config
        .manifest
        .iter()
        .flat_map(|m| m.widgets.iter())
        .filter_map(|w| w.data.clone())
        .collect()
}

/// Expand symbolic `@group` tokens and de-duplicate by first occurrence.
///
/// Literal URLs pass through in declared order and never touch the group
/// resolver. Unresolvable tokens fail the build.
pub fn expand_preload_urls(
    urls: &[String],
    groups: &dyn PreloadGroups,
) -> Result<Vec<String>, ReferenceError> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for url in urls {
        if let Some(group) = url.strip_prefix('@') {
            let expanded = groups
                .urls_for(group)
                .ok_or_else(|| ReferenceError::PreloadGroup(group.to_string()))?;
            for expanded_url in expanded {
                if seen.insert(expanded_url.clone()) {
                    out.push(expanded_url);
                }
            }
        } else if seen.insert(url.clone()) {
            out.push(url.clone());
        }
    }
    Ok(out)
}

/// Build the service worker script. Returns `None` when the feature is
/// disabled or no source script is configured.
pub fn build(
    config: &PwaConfig,
    root: &Path,
    groups: &dyn PreloadGroups,
) -> Result<Option<Vec<u8>>, ServiceWorkerError> {
    let Some(sw) = config.serviceworker.as_ref().filter(|s| s.enabled) else {
        return Ok(None);
    };
    if sw.src.is_empty() {
        return Ok(None);
    }

    let user_script = fs::read_to_string(root.join(&sw.src))?;
    let mut script = String::new();
    if let Some(block) = render_caching_block(sw, groups)? {
        script.push_str(&block);
        script.push('\n');
    }
    script.push_str(&user_script);
    Ok(Some(script.into_bytes()))
}

/// One expanded resource-cache rule, ready for rendering. Also the unit
/// the cache version hash is computed over.
#[derive(Debug, Serialize)]
struct ExpandedCache<'a> {
    match_callback: &'a str,
    strategy: &'static str,
    cache_name: String,
    broadcast: bool,
    preload_urls: Vec<String>,
}

fn render_caching_block(
    sw: &ServiceWorkerConfig,
    groups: &dyn PreloadGroups,
) -> Result<Option<String>, ServiceWorkerError> {
    let workbox = &sw.workbox;
    if !workbox.enabled
        || (workbox.resource_caches.is_empty() && workbox.offline_fallback.is_none())
    {
        return Ok(None);
    }

    let caches: Vec<ExpandedCache> = workbox
        .resource_caches
        .iter()
        .enumerate()
        .map(|(i, cache)| {
            Ok(ExpandedCache {
                match_callback: &cache.match_callback,
                strategy: cache.strategy.constructor(),
                cache_name: cache
                    .cache_name
                    .clone()
                    .unwrap_or_else(|| format!("cache-{i}")),
                broadcast: cache.broadcast,
                preload_urls: expand_preload_urls(&cache.preload_urls, groups)?,
            })
        })
        .collect::<Result<_, ReferenceError>>()?;

    let version = rules_version(&caches, workbox.offline_fallback.as_ref().map(|f| &*f.page))?;

    let mut block = String::new();
    block.push_str(&format!(
        "// --- generated caching rules (version {version}) ---\n\
         // Derived from configuration; regenerated on every build.\n"
    ));
    for cache in &caches {
        block.push_str(&render_cache_rule(cache, &version));
    }
    if let Some(fallback) = &workbox.offline_fallback {
        block.push_str(&format!(
            "workbox.recipes.offlineFallback({{ pageFallback: {} }});\n",
            js_str(&fallback.page)
        ));
    }
    block.push_str("// --- end generated caching rules ---\n");
    Ok(Some(block))
}

/// Version suffix for cache names: SHA-256 over the expanded rules,
/// truncated to 8 hex characters.
fn rules_version(
    caches: &[ExpandedCache],
    offline_page: Option<&str>,
) -> Result<String, ServiceWorkerError> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(caches)?);
    if let Some(page) = offline_page {
        hasher.update(page.as_bytes());
    }
    let digest = hasher.finalize();
    Ok(digest[..4].iter().map(|b| format!("{b:02x}")).collect())
}

fn render_cache_rule(cache: &ExpandedCache, version: &str) -> String {
    let versioned_name = format!("{}-v{}", cache.cache_name, version);
    let plugins = if cache.broadcast {
        "\n    plugins: [new workbox.broadcastUpdate.BroadcastUpdatePlugin()],"
    } else {
        ""
    };

    let mut rule = format!(
        "workbox.routing.registerRoute(\n  {},\n  new workbox.strategies.{}({{\n    cacheName: {},{}\n  }})\n);\n",
        render_match(cache.match_callback),
        cache.strategy,
        js_str(&versioned_name),
        plugins,
    );

    if !cache.preload_urls.is_empty() {
        let urls: Vec<String> = cache.preload_urls.iter().map(|u| js_str(u)).collect();
        rule.push_str(&format!(
            "self.addEventListener(\"install\", (event) => {{\n  event.waitUntil(\n    caches.open({}).then((cache) => cache.addAll([{}]))\n  );\n}});\n",
            js_str(&versioned_name),
            urls.join(", "),
        ));
    }
    rule
}

/// Render a match callback: `regex:<pattern>`, `navigate`, or a URL path
/// prefix.
fn render_match(callback: &str) -> String {
    if let Some(pattern) = callback.strip_prefix("regex:") {
        format!("({{url}}) => new RegExp({}).test(url.pathname)", js_str(pattern))
    } else if callback == "navigate" {
        "({request}) => request.mode === \"navigate\"".to_string()
    } else {
        format!("({{url}}) => url.pathname.startsWith({})", js_str(callback))
    }
}

/// Quote a string as a JS string literal. JSON string syntax is a subset
/// of JS, so this is escape-safe.
pub(crate) fn js_str(s: &str) -> String {
    serde_json::to_string(s).expect("string must serialize")
}
