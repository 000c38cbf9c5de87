//! The fill pass: hash every record with an empty `sha256`, then write once.
//!
//! The manifest is written only after every pending record has been hashed.
//! A failure part way through leaves the file exactly as it was, and a manifest
//! with nothing to fill is never rewritten.

use crate::hasher::ArtifactHasher;
use crate::manifest::Manifest;
use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct FillOptions {
    /// Report pending records without hashing or writing.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillSummary {
    /// Top-level entries in the manifest.
    pub records: usize,
    /// Records whose `sha256` was empty at load time.
    pub pending: usize,
    pub filled: usize,
    pub written: bool,
}

pub fn run<H: ArtifactHasher>(
    manifest_path: &Path,
    hasher: &mut H,
    options: FillOptions,
) -> Result<FillSummary> {
    let mut manifest = Manifest::load(manifest_path)?;
    let pending = manifest.pending()?;
    let mut summary = FillSummary {
        records: manifest.len(),
        pending: pending.len(),
        ..FillSummary::default()
    };

    if manifest.is_empty() {
        tracing::warn!(path = %manifest.path().display(), "manifest has no entries");
    }

    if options.dry_run {
        for record in &pending {
            println!(
                "Package {} has no sha256 ({})",
                record.name, record.coordinate
            );
        }
        return Ok(summary);
    }

    if pending.is_empty() {
        tracing::debug!(path = %manifest.path().display(), "all records hashed; nothing to write");
        return Ok(summary);
    }

    hasher.preflight()?;

    let mut dirty = false;
    for record in pending {
        println!("Package {} has no sha256. Fetching...", record.name);
        let hash = hasher
            .hash(&record.coordinate)
            .with_context(|| format!("compute sha256 for package {}", record.name))?;
        println!("Package {} now has sha256 {hash}", record.name);
        manifest.set_sha256(&record.name, &hash)?;
        summary.filled += 1;
        dirty = true;
    }

    if dirty {
        manifest.save()?;
        summary.written = true;
        tracing::info!(
            path = %manifest.path().display(),
            filled = summary.filled,
            "manifest updated"
        );
    }
    Ok(summary)
}
