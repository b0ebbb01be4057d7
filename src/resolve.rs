//! Host-supplied resolution capabilities.
//!
//! Three look-up seams connect the pipeline to its host:
//!
//! - [`UrlResolver`] maps named routes (`{ path = "agenda", params = {...} }`)
//!   and logical asset references to public URLs.
//! - [`PreloadGroups`] maps symbolic `@group` tokens in `preload_urls` to
//!   concrete URL lists.
//! - Failures surface as [`ReferenceError`] and abort the build pass.
//!
//! Hosts without a router can use [`IdentityResolver`] (assets become
//! root-relative URLs, routes never resolve) and [`StaticGroups`].

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("route `{0}` cannot be resolved")]
    Route(String),
    #[error("asset `{0}` cannot be resolved")]
    Asset(String),
    #[error("preload group `@{0}` cannot be resolved")]
    PreloadGroup(String),
}

/// Maps logical references to public URLs.
pub trait UrlResolver {
    /// Resolve a named route with parameters. `None` = unknown route.
    fn resolve_route(&self, name: &str, params: &BTreeMap<String, String>) -> Option<String>;

    /// Resolve a logical asset path to its public URL. `None` = unknown asset.
    fn resolve_asset(&self, logical_path: &str) -> Option<String>;
}

/// Resolver for static hosts: every asset maps to a root-relative URL,
/// named routes do not exist.
pub struct IdentityResolver;

impl UrlResolver for IdentityResolver {
    fn resolve_route(&self, _name: &str, _params: &BTreeMap<String, String>) -> Option<String> {
        None
    }

    fn resolve_asset(&self, logical_path: &str) -> Option<String> {
        Some(format!("/{}", logical_path.trim_start_matches('/')))
    }
}

/// Maps a symbolic preload group name (without the `@`) to its URL list.
pub trait PreloadGroups {
    fn urls_for(&self, group: &str) -> Option<Vec<String>>;
}

/// Group registry with no entries. Every `@token` fails to resolve.
pub struct NoGroups;

impl PreloadGroups for NoGroups {
    fn urls_for(&self, _group: &str) -> Option<Vec<String>> {
        None
    }
}

/// In-memory group registry.
#[derive(Debug, Clone, Default)]
pub struct StaticGroups {
    groups: BTreeMap<String, Vec<String>>,
}

impl StaticGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: impl Into<String>, urls: Vec<String>) {
        self.groups.insert(group.into(), urls);
    }
}

impl PreloadGroups for StaticGroups {
    fn urls_for(&self, group: &str) -> Option<Vec<String>> {
        self.groups.get(group).cloned()
    }
}
