//! Resolution of the external tool commands and staging layout.
//!
//! Each setting is resolved in priority order:
//! 1. CLI flag
//! 2. `SHAFILL_*` environment variable
//! 3. Built-in default (`cs fetch`, `nix hash path`, `share/java`)

use crate::cli::RootArgs;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

pub const FETCH_COMMAND_ENV: &str = "SHAFILL_FETCH_COMMAND";
pub const HASH_COMMAND_ENV: &str = "SHAFILL_HASH_COMMAND";
pub const LAYOUT_ENV: &str = "SHAFILL_LAYOUT";

pub const DEFAULT_FETCH_COMMAND: &str = "cs fetch";
pub const DEFAULT_HASH_COMMAND: &str = "nix hash path";
/// Install layout the directory hash is expected to cover.
pub const DEFAULT_LAYOUT: &str = "share/java";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillConfig {
    /// Fetch argv; the coordinate is appended per record.
    pub fetch_command: Vec<String>,
    /// Hash argv; the staging root is appended per record.
    pub hash_command: Vec<String>,
    /// Relative directory inside the staging root that receives artifacts.
    pub layout: PathBuf,
    pub work_dir: Option<PathBuf>,
    pub keep_staging: bool,
}

impl FillConfig {
    /// Resolve settings from CLI args and the process environment.
    pub fn from_args(args: &RootArgs) -> Result<Self> {
        Self::resolve(args, |key| env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup.
    pub fn resolve<F>(args: &RootArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch_raw = pick(args.fetch_command.as_deref(), &lookup, FETCH_COMMAND_ENV)
            .unwrap_or_else(|| DEFAULT_FETCH_COMMAND.to_string());
        let hash_raw = pick(args.hash_command.as_deref(), &lookup, HASH_COMMAND_ENV)
            .unwrap_or_else(|| DEFAULT_HASH_COMMAND.to_string());
        let layout_raw = pick(args.layout.as_deref(), &lookup, LAYOUT_ENV)
            .unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

        Ok(Self {
            fetch_command: parse_command(&fetch_raw).context("resolve fetch command")?,
            hash_command: parse_command(&hash_raw).context("resolve hash command")?,
            layout: parse_layout(&layout_raw)?,
            work_dir: args.work_dir.clone(),
            keep_staging: args.keep_staging,
        })
    }
}

fn pick<F>(explicit: Option<&str>, lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(|s| s.to_string())
        .or_else(|| lookup(key).filter(|value| !value.trim().is_empty()))
}

/// Split a command line with shell quoting rules.
pub fn parse_command(raw: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(raw).with_context(|| format!("parse command: {raw}"))?;
    if argv.is_empty() {
        return Err(anyhow!("command is empty"));
    }
    Ok(argv)
}

fn parse_layout(raw: &str) -> Result<PathBuf> {
    let path = Path::new(raw.trim());
    if path.as_os_str().is_empty() {
        return Err(anyhow!("staging layout is empty"));
    }
    if !path
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(anyhow!(
            "staging layout must be a plain relative path, got {raw:?}"
        ));
    }
    Ok(path.to_path_buf())
}
