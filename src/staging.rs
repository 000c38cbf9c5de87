//! Per-artifact staging area.
//!
//! Every hash computation gets its own uniquely named directory:
//!
//! ```text
//! .shafill-XXXXXX/
//!   deps            fetch tool stdout, one artifact path per line
//!   root/           directory handed to the hash tool
//!     share/java/   configured layout; fetched files are copied here
//! ```
//!
//! The directory is removed when the `StagingArea` drops, unless it was created
//! with `keep` set.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const LIST_FILE_NAME: &str = "deps";
pub const STAGING_ROOT_NAME: &str = "root";
const STAGING_PREFIX: &str = ".shafill-";

#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn create(work_dir: Option<&Path>, keep: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).disable_cleanup(keep);
        let dir = match work_dir {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .context("create staging directory")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the hash tool is pointed at.
    pub fn root(&self) -> PathBuf {
        self.path().join(STAGING_ROOT_NAME)
    }

    pub fn list_file(&self) -> PathBuf {
        self.path().join(LIST_FILE_NAME)
    }

    /// Persist the fetch tool's stdout as the list file.
    pub fn write_list(&self, fetch_stdout: &[u8]) -> Result<()> {
        let list_file = self.list_file();
        fs::write(&list_file, fetch_stdout)
            .with_context(|| format!("write {}", list_file.display()))
    }

    /// Artifact paths named in the list file, one per non-blank line.
    pub fn read_list(&self) -> Result<Vec<PathBuf>> {
        let list_file = self.list_file();
        let text = fs::read_to_string(&list_file)
            .with_context(|| format!("read {}", list_file.display()))?;
        Ok(parse_path_list(&text))
    }

    /// Create `root/<layout>` and copy each artifact into it by file name.
    pub fn stage_artifacts(&self, layout: &Path, artifacts: &[PathBuf]) -> Result<PathBuf> {
        let target_dir = self.root().join(layout);
        fs::create_dir_all(&target_dir)
            .with_context(|| format!("create {}", target_dir.display()))?;

        for artifact in artifacts {
            if !artifact.is_file() {
                return Err(anyhow!(
                    "fetched artifact {} is not a file",
                    artifact.display()
                ));
            }
            let file_name = artifact.file_name().ok_or_else(|| {
                anyhow!("fetched artifact {} has no file name", artifact.display())
            })?;
            let dest = target_dir.join(file_name);
            if dest.exists() {
                tracing::warn!(
                    path = %artifact.display(),
                    "artifact file name already staged; overwriting"
                );
            }
            fs::copy(artifact, &dest).with_context(|| {
                format!("copy {} to {}", artifact.display(), dest.display())
            })?;
        }
        Ok(target_dir)
    }

    /// Files under the staging root, relative to it and sorted.
    pub fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let root = self.root();
        let files = collect_files_recursive(&root)?;
        files
            .into_iter()
            .map(|file| {
                file.strip_prefix(&root)
                    .map(Path::to_path_buf)
                    .context("strip staging prefix")
            })
            .collect()
    }
}

fn parse_path_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(path, contents.as_bytes()).expect("write file");
    }

    #[test]
    fn list_file_round_trips_fetch_output() {
        let work = tempfile::tempdir().expect("work dir");
        let staging = StagingArea::create(Some(work.path()), false).expect("staging");
        staging
            .write_list(b"/cache/a.jar\n\n  /cache/b.jar  \n")
            .expect("write list");
        assert_eq!(
            staging.read_list().expect("read list"),
            vec![PathBuf::from("/cache/a.jar"), PathBuf::from("/cache/b.jar")]
        );
    }

    #[test]
    fn artifacts_land_in_layout_directory() {
        let work = tempfile::tempdir().expect("work dir");
        let cache = tempfile::tempdir().expect("cache dir");
        let jar_a = cache.path().join("org/a/a-1.0.jar");
        let jar_b = cache.path().join("org/b/b-2.0.jar");
        write_file(&jar_a, "a");
        write_file(&jar_b, "b");

        let staging = StagingArea::create(Some(work.path()), false).expect("staging");
        let target = staging
            .stage_artifacts(Path::new("share/java"), &[jar_a, jar_b])
            .expect("stage");
        assert_eq!(target, staging.root().join("share/java"));
        assert_eq!(
            staging.staged_files().expect("staged files"),
            vec![
                PathBuf::from("share/java/a-1.0.jar"),
                PathBuf::from("share/java/b-2.0.jar"),
            ]
        );
        assert_eq!(
            fs::read_to_string(target.join("b-2.0.jar")).expect("read staged"),
            "b"
        );
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let work = tempfile::tempdir().expect("work dir");
        let staging = StagingArea::create(Some(work.path()), false).expect("staging");
        let err = staging
            .stage_artifacts(Path::new("share/java"), &[work.path().join("absent.jar")])
            .expect_err("missing artifact");
        assert!(err.to_string().contains("absent.jar"));
    }

    #[test]
    fn staging_directories_are_unique_and_removed_on_drop() {
        let work = tempfile::tempdir().expect("work dir");
        let first = StagingArea::create(Some(work.path()), false).expect("first");
        let second = StagingArea::create(Some(work.path()), false).expect("second");
        assert_ne!(first.path(), second.path());
        let first_path = first.path().to_path_buf();
        drop(first);
        drop(second);
        assert!(!first_path.exists());
        assert_eq!(fs::read_dir(work.path()).expect("list").count(), 0);
    }

    #[test]
    fn keep_leaves_directory_behind() {
        let work = tempfile::tempdir().expect("work dir");
        let staging = StagingArea::create(Some(work.path()), true).expect("staging");
        staging.write_list(b"/x.jar\n").expect("write list");
        let path = staging.path().to_path_buf();
        drop(staging);
        assert!(path.join(LIST_FILE_NAME).is_file());
    }
}
