//! Package manifest load, inspection, and rewrite.
//!
//! The manifest is kept as a raw JSON object so fields this tool does not know
//! about, key order, and number literals all survive a rewrite untouched. Only
//! the `sha256` string of a record is ever modified.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Record field holding the content hash; `""` marks it as not yet computed.
pub const SHA256_FIELD: &str = "sha256";

/// Upstream identity of a package, as the fetch tool understands it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactCoordinate {
    pub artifact: String,
    pub version: String,
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.artifact, self.version)
    }
}

/// A record whose hash still has to be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub name: String,
    pub coordinate: ArtifactCoordinate,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .with_context(|| format!("parse manifest {}", path.display()))?;
        let Value::Object(entries) = value else {
            return Err(anyhow!(
                "manifest {} must be a JSON object keyed by package name",
                path.display()
            ));
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records with an empty `sha256`, in file order.
    ///
    /// Values that are not objects, or whose `sha256` is absent or not a string,
    /// are not considered pending. A pending record must name its artifact and
    /// version as strings.
    pub fn pending(&self) -> Result<Vec<PendingRecord>> {
        let mut pending = Vec::new();
        for (name, record) in &self.entries {
            if !needs_hash(record) {
                continue;
            }
            let coordinate = ArtifactCoordinate::deserialize(record)
                .with_context(|| format!("package {name}: read artifact and version"))?;
            pending.push(PendingRecord {
                name: name.clone(),
                coordinate,
            });
        }
        Ok(pending)
    }

    pub fn set_sha256(&mut self, name: &str, hash: &str) -> Result<()> {
        let record = self
            .entries
            .get_mut(name)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| anyhow!("package {name} is not a record in the manifest"))?;
        record.insert(SHA256_FIELD.to_string(), Value::String(hash.to_string()));
        Ok(())
    }

    /// Pretty JSON (2-space indent) with a single trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut text =
            serde_json::to_string_pretty(&self.entries).context("serialize manifest")?;
        text.push('\n');
        Ok(text)
    }

    /// Overwrite the manifest file through a uniquely named sibling temp file.
    ///
    /// Symlinks are resolved first so the link target is what gets replaced.
    pub fn save(&self) -> Result<()> {
        let text = self.to_json()?;
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".shafill-manifest-")
            .tempfile_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .with_context(|| format!("write {}", tmp.path().display()))?;
        if let Ok(metadata) = fs::metadata(&target) {
            fs::set_permissions(tmp.path(), metadata.permissions())
                .with_context(|| format!("copy permissions to {}", tmp.path().display()))?;
        }
        tmp.persist(&target)
            .map_err(|err| err.error)
            .with_context(|| format!("replace {}", target.display()))?;
        Ok(())
    }
}

fn needs_hash(record: &Value) -> bool {
    record.get(SHA256_FIELD).and_then(Value::as_str) == Some("")
}
