//! # pwa-press
//!
//! A standalone Progressive Web App asset generator. Your `pwa.toml` is the
//! data source: one declarative file describes the web manifest, the service
//! worker, and the favicon set, and one build pass turns it into the files a
//! browser needs.
//!
//! # Architecture: One Pass, Three Builders
//!
//! A build pass moves through four phases and never writes early:
//!
//! ```text
//! Validate   pwa.toml       →  normalized PwaConfig (or a failed build)
//! Build      config         →  manifest + icons + service worker bytes
//! Write      bytes          →  host sink, all-or-nothing
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **No partial sites**: writing begins only after every builder has
//!   produced its bytes, so a broken config can never leave a half-updated
//!   asset directory behind.
//! - **Host independence**: builders hand bytes to an [`compile::AssetSink`]
//!   capability; the CLI plugs in a directory, a framework plugs in its
//!   asset pipeline, tests plug in memory.
//! - **Testability**: each builder is a function from configuration to
//!   bytes, so unit tests exercise the interesting logic without a browser
//!   or a filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `pwa.toml` loading, validation with path-named errors, stock defaults |
//! | [`imaging`] | Pluggable image backends: raster resize/encode or pass-through |
//! | [`manifest`] | Web manifest document + one icon asset per `(size, format)` |
//! | [`serviceworker`] | Caching-rules block + user script concatenation |
//! | [`favicons`] | Standard favicon set from a single source image |
//! | [`compile`] | The build pass: state machine, path normalization, sinks |
//! | [`resolve`] | Host capabilities: route/asset resolution, preload groups |
//! | [`html`] | `<head>` snippet: manifest link, icon links, SW registration |
//! | [`output`] | CLI output formatting — grouped artifact report |
//! | [`types`] | Shared types (`BuildOutput`, `ArtifactKind`) |
//!
//! # Design Decisions
//!
//! ## Deterministic Output
//!
//! Identical configuration produces identical bytes: manifest keys
//! serialize in a fixed order, icon variants derive in parallel but collect
//! in plan order, and service-worker cache names are versioned by a hash of
//! the rules rather than a timestamp. Deploys stay diffable and caches
//! invalidate exactly when configuration changes.
//!
//! ## Pure-Rust Imaging (No ImageMagick)
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling,
//! PNG/WebP/JPEG/ICO encoders) — pure Rust, statically linked. No system
//! dependencies, no version conflicts; the binary just works. SVG sources
//! are passed through rather than rasterized, matching the manifest spec's
//! `sizes: "any"`.
//!
//! ## Backends Behind a Trait
//!
//! Everything that touches pixels sits behind
//! [`imaging::ImageBackend`], selected once from the `image_backend`
//! configuration key. Tests swap in a recording mock; SVG-only deployments
//! swap in the pass-through backend. No runtime reflection, just a match.
//!
//! ## Capabilities Over Globals
//!
//! Route resolution, symbolic preload groups, and the write target are
//! traits supplied by the host ([`resolve`], [`compile::AssetSink`]). The
//! host holds exactly one reference into this crate: [`compile::compile`].

pub mod compile;
pub mod config;
pub mod favicons;
pub mod html;
pub mod imaging;
pub mod manifest;
pub mod output;
pub mod resolve;
pub mod serviceworker;
pub mod types;
