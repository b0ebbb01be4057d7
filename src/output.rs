//! CLI output formatting for the build pass.
//!
//! Output is information-centric: the primary display for every artifact is
//! its public URL — the thing a browser will actually request — with byte
//! size as context. Artifacts are grouped by kind in a fixed order so two
//! runs over the same configuration print identically.
//!
//! ```text
//! Manifest
//!     /site.webmanifest (1.2 KiB)
//! Service worker
//!     /sw.js (3.4 KiB)
//! Icons
//!     /pwa/app-48x48.webp (845 B)
//!     /pwa/app-96x96.webp (2.1 KiB)
//! Favicons
//!     /favicon-16x16.png (312 B)
//!
//! Wrote 5 artifacts (4.8 KiB)
//! ```
//!
//! Each `format_*` function is pure (returns `Vec<String>`, no I/O); the
//! `print_*` wrapper writes to stdout.

use crate::compile::CompileSummary;
use crate::types::ArtifactKind;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a byte count for humans.
fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    if bytes < 1024 {
        format!("{bytes} B")
    } else if (bytes as f64) < KIB * KIB {
        format!("{:.1} KiB", bytes as f64 / KIB)
    } else {
        format!("{:.1} MiB", bytes as f64 / (KIB * KIB))
    }
}

/// Section header for an artifact kind.
fn kind_header(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Manifest => "Manifest",
        ArtifactKind::ServiceWorker => "Service worker",
        ArtifactKind::Icon => "Icons",
        ArtifactKind::Favicon => "Favicons",
    }
}

/// Fixed display order for artifact groups.
const KIND_ORDER: &[ArtifactKind] = &[
    ArtifactKind::Manifest,
    ArtifactKind::ServiceWorker,
    ArtifactKind::Icon,
    ArtifactKind::Favicon,
];

/// Format the build summary.
pub fn format_build_output(summary: &CompileSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for &kind in KIND_ORDER {
        let records: Vec<_> = summary
            .written
            .iter()
            .filter(|r| r.kind == kind)
            .collect();
        if records.is_empty() {
            continue;
        }
        lines.push(kind_header(kind).to_string());
        for record in records {
            lines.push(format!(
                "{}{} ({})",
                indent(1),
                record.public_url,
                human_size(record.size)
            ));
        }
    }

    if !summary.skipped.is_empty() {
        lines.push("Skipped".to_string());
        for &kind in &summary.skipped {
            lines.push(format!("{}{} (no public URL configured)", indent(1), kind));
        }
    }

    if summary.written.is_empty() {
        lines.push("Nothing to write (all features disabled)".to_string());
    } else {
        let total: usize = summary.written.iter().map(|r| r.size).sum();
        lines.push(String::new());
        lines.push(format!(
            "Wrote {} artifact{} ({})",
            summary.written.len(),
            if summary.written.len() == 1 { "" } else { "s" },
            human_size(total)
        ));
    }

    lines
}

/// Print the build summary to stdout.
pub fn print_build_output(summary: &CompileSummary) {
    for line in format_build_output(summary) {
        println!("{line}");
    }
}
