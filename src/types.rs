//! Shared types used across the build pass.

use std::fmt;

/// One generated artifact: the public URL it will be served from and its
/// bytes. Created fresh on every build invocation; the host filesystem is
/// the only durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub public_url: String,
    pub bytes: Vec<u8>,
}

impl BuildOutput {
    pub fn new(public_url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            public_url: public_url.into(),
            bytes,
        }
    }
}

/// What kind of artifact a build output is. Used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Manifest,
    ServiceWorker,
    Icon,
    Favicon,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Manifest => "manifest",
            Self::ServiceWorker => "service worker",
            Self::Icon => "icon",
            Self::Favicon => "favicon",
        };
        f.write_str(label)
    }
}
