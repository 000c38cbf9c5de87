//! Artifact hashing through external tools.
//!
//! `CommandHasher` runs the fetch tool, stages the fetched files into the
//! configured install layout, and runs the directory hash tool over the staging
//! root. Each step is a separate process call whose status and output are
//! checked before the next one starts.

use crate::config::FillConfig;
use crate::manifest::ArtifactCoordinate;
use crate::staging::StagingArea;
use crate::util::stderr_summary;
use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::Instant;

/// Computes the content hash of one artifact.
pub trait ArtifactHasher {
    fn hash(&mut self, coordinate: &ArtifactCoordinate) -> Result<String>;

    /// Checks run once before the first hash of a run.
    fn preflight(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct CommandHasher {
    config: FillConfig,
}

impl CommandHasher {
    pub fn new(config: FillConfig) -> Self {
        Self { config }
    }

    fn fetch(
        &self,
        coordinate: &ArtifactCoordinate,
        staging: &StagingArea,
    ) -> Result<Vec<PathBuf>> {
        let coordinate_arg = coordinate.to_string();
        let output = run_tool(
            "fetch",
            &self.config.fetch_command,
            OsStr::new(&coordinate_arg),
        )?;
        staging.write_list(&output.stdout)?;
        let artifacts = staging.read_list()?;
        if artifacts.is_empty() {
            return Err(anyhow!("fetch of {coordinate} returned no artifact paths"));
        }
        tracing::debug!(
            coordinate = %coordinate,
            artifacts = artifacts.len(),
            "fetched artifacts"
        );
        Ok(artifacts)
    }

    fn hash_root(&self, staging: &StagingArea) -> Result<String> {
        let root = staging.root();
        let output = run_tool("hash", &self.config.hash_command, root.as_os_str())?;
        let stdout =
            String::from_utf8(output.stdout).context("decode hash tool stdout as UTF-8")?;
        let hash = stdout.trim();
        if hash.is_empty() {
            return Err(anyhow!("hash tool printed nothing for {}", root.display()));
        }
        Ok(hash.to_string())
    }
}

impl ArtifactHasher for CommandHasher {
    fn hash(&mut self, coordinate: &ArtifactCoordinate) -> Result<String> {
        let staging =
            StagingArea::create(self.config.work_dir.as_deref(), self.config.keep_staging)?;
        if self.config.keep_staging {
            tracing::info!(path = %staging.path().display(), "keeping staging directory");
        }

        let artifacts = self.fetch(coordinate, &staging)?;
        staging
            .stage_artifacts(&self.config.layout, &artifacts)
            .with_context(|| format!("stage {coordinate}"))?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let files = staging.staged_files()?;
            tracing::debug!(?files, "staged layout");
        }

        self.hash_root(&staging)
            .with_context(|| format!("hash staged {coordinate}"))
    }

    fn preflight(&mut self) -> Result<()> {
        for (label, argv) in [
            ("fetch", &self.config.fetch_command),
            ("hash", &self.config.hash_command),
        ] {
            let program = argv
                .first()
                .ok_or_else(|| anyhow!("{label} command is empty"))?;
            let resolved = which::which(program)
                .with_context(|| format!("{label} tool {program:?} not found on PATH"))?;
            tracing::debug!(tool = label, path = %resolved.display(), "resolved tool");
        }
        Ok(())
    }
}

/// Run `argv` with one trailing argument, requiring a zero exit status.
fn run_tool(label: &str, argv: &[String], trailing: &OsStr) -> Result<Output> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("{label} command is empty"))?;
    let start = Instant::now();
    let output = Command::new(program)
        .args(args)
        .arg(trailing)
        .output()
        .with_context(|| format!("run {label} tool {program}"))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::info!(
        tool = label,
        elapsed_ms,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "{label} tool complete"
    );

    if !output.status.success() {
        let detail = stderr_summary(&output.stderr)
            .unwrap_or_else(|| "no stderr output".to_string());
        return Err(anyhow!("{label} failed ({}): {detail}", output.status));
    }
    Ok(output)
}
