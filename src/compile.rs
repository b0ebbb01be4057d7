//! Compile-time asset writing.
//!
//! The single host-facing entry point. A build pass runs once per host
//! compile/publish cycle:
//!
//! ```text
//! NotStarted → Validating → Building → Writing → Done
//! ```
//!
//! Validation failure terminates the pass before anything else happens.
//! Writing begins only after every builder has produced its bytes, so no
//! partial artifact set is ever written. A feature whose public URL is not
//! configured is silently skipped at write time — building it is still
//! useful to hosts that post-process outputs, and skipping is not an error.
//!
//! Public paths are normalized to a single leading `/` and no trailing `/`
//! before reaching the sink.

use crate::config::{ConfigError, PwaConfig};
use crate::favicons;
use crate::imaging::{BackendError, ImageBackend};
use crate::manifest::{self, ManifestError};
use crate::resolve::{PreloadGroups, UrlResolver};
use crate::serviceworker::{self, ServiceWorkerError};
use crate::types::{ArtifactKind, BuildOutput};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sink write failure. Fatal to the build.
#[derive(Error, Debug)]
#[error("failed to write `{path}`: {source}")]
pub struct WriteError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Favicons(#[from] BackendError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    ServiceWorker(#[from] ServiceWorkerError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Where a pass currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    NotStarted,
    Validating,
    Building,
    Writing,
    Done,
}

/// Host-supplied write capability.
pub trait AssetSink {
    fn write(&mut self, public_path: &str, bytes: &[u8]) -> Result<(), WriteError>;
}

/// Sink writing under a root directory, creating parents as needed.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSink for DirectorySink {
    fn write(&mut self, public_path: &str, bytes: &[u8]) -> Result<(), WriteError> {
        let target = self.root.join(public_path.trim_start_matches('/'));
        let result = (|| -> io::Result<()> {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, bytes)
        })();
        result.map_err(|source| WriteError {
            path: public_path.to_string(),
            source,
        })
    }
}

/// Sink collecting outputs in memory. For dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, public_path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(path, _)| path == public_path)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

impl AssetSink for MemorySink {
    fn write(&mut self, public_path: &str, bytes: &[u8]) -> Result<(), WriteError> {
        self.files.push((public_path.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Normalize a public path: exactly one leading `/`, no trailing `/`.
pub fn normalize_public_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

/// One written artifact, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub public_url: String,
    pub size: usize,
}

/// What a pass wrote and what it skipped (built, but no public URL).
#[derive(Debug, Clone, Default)]
pub struct CompileSummary {
    pub written: Vec<ArtifactRecord>,
    pub skipped: Vec<ArtifactKind>,
}

/// Group registry layered over the host's: `@widgets` is answered from the
/// configuration, everything else is delegated.
struct ConfigGroups<'a> {
    widgets: Vec<String>,
    host: &'a dyn PreloadGroups,
}

impl PreloadGroups for ConfigGroups<'_> {
    fn urls_for(&self, group: &str) -> Option<Vec<String>> {
        if group == "widgets" {
            return Some(self.widgets.clone());
        }
        self.host.urls_for(group)
    }
}

/// One build pass over a configuration.
pub struct CompilePass<'a> {
    config: &'a PwaConfig,
    root: &'a Path,
    backend: &'a dyn ImageBackend,
    resolver: &'a dyn UrlResolver,
    groups: &'a dyn PreloadGroups,
    phase: BuildPhase,
}

impl<'a> CompilePass<'a> {
    pub fn new(
        config: &'a PwaConfig,
        root: &'a Path,
        backend: &'a dyn ImageBackend,
        resolver: &'a dyn UrlResolver,
        groups: &'a dyn PreloadGroups,
    ) -> Self {
        Self {
            config,
            root,
            backend,
            resolver,
            groups,
            phase: BuildPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Run the pass. Any error aborts before the first write.
    pub fn run(&mut self, sink: &mut dyn AssetSink) -> Result<CompileSummary, CompileError> {
        self.phase = BuildPhase::Validating;
        self.config.validate()?;

        self.phase = BuildPhase::Building;
        let favicon_outputs = favicons::build(self.config, self.root, self.backend)?;
        let manifest_assets =
            manifest::build(self.config, self.root, self.backend, self.resolver)?;
        let groups = ConfigGroups {
            widgets: serviceworker::widget_preload_urls(self.config),
            host: self.groups,
        };
        let sw_script = serviceworker::build(self.config, self.root, &groups)?;

        self.phase = BuildPhase::Writing;
        let mut summary = CompileSummary::default();

        if let Some(outputs) = &favicon_outputs {
            for output in outputs {
                write_artifact(sink, &mut summary, ArtifactKind::Favicon, output)?;
            }
        }
        if let Some(assets) = &manifest_assets {
            for output in &assets.assets {
                write_artifact(sink, &mut summary, ArtifactKind::Icon, output)?;
            }
            match assets.public_url.as_deref() {
                Some(url) if !url.is_empty() => {
                    let output = BuildOutput::new(url, assets.document.clone());
                    write_artifact(sink, &mut summary, ArtifactKind::Manifest, &output)?;
                }
                _ => summary.skipped.push(ArtifactKind::Manifest),
            }
        }
        if let Some(script) = sw_script {
            let public_url = self
                .config
                .serviceworker
                .as_ref()
                .and_then(|sw| sw.public_url.clone());
            match public_url.as_deref() {
                Some(url) if !url.is_empty() => {
                    let output = BuildOutput::new(url, script);
                    write_artifact(sink, &mut summary, ArtifactKind::ServiceWorker, &output)?;
                }
                _ => summary.skipped.push(ArtifactKind::ServiceWorker),
            }
        }

        self.phase = BuildPhase::Done;
        Ok(summary)
    }
}

fn write_artifact(
    sink: &mut dyn AssetSink,
    summary: &mut CompileSummary,
    kind: ArtifactKind,
    output: &BuildOutput,
) -> Result<(), WriteError> {
    let path = normalize_public_path(&output.public_url);
    sink.write(&path, &output.bytes)?;
    summary.written.push(ArtifactRecord {
        kind,
        public_url: path,
        size: output.bytes.len(),
    });
    Ok(())
}

/// Run one full build pass. This is the only entry point a host needs.
pub fn compile(
    config: &PwaConfig,
    root: &Path,
    backend: &dyn ImageBackend,
    resolver: &dyn UrlResolver,
    groups: &dyn PreloadGroups,
    sink: &mut dyn AssetSink,
) -> Result<CompileSummary, CompileError> {
    CompilePass::new(config, root, backend, resolver, groups).run(sink)
}
