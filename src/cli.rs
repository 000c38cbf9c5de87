//! CLI argument parsing for the manifest hash fill.
//!
//! The CLI stays thin: it only collects inputs. Defaults for the external tools
//! live in `config` so env overrides and flag overrides resolve in one place.
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "shafill",
    version,
    about = "Fill empty sha256 fields in a package manifest",
    after_help = "Records whose sha256 is \"\" are fetched, staged into a canonical layout, and hashed.\nThe manifest is rewritten only when at least one record changed.\n\nExamples:\n  shafill deps.json\n  shafill deps.json --dry-run\n  shafill deps.json --fetch-command 'cs fetch --no-default' --layout share/java"
)]
pub struct RootArgs {
    /// Manifest JSON file to update in place
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Fetch command; `<artifact>:<version>` is appended [env: SHAFILL_FETCH_COMMAND]
    #[arg(long, value_name = "CMD")]
    pub fetch_command: Option<String>,

    /// Directory hash command; the staging root is appended [env: SHAFILL_HASH_COMMAND]
    #[arg(long, value_name = "CMD")]
    pub hash_command: Option<String>,

    /// Staging subdirectory the fetched files are copied into [env: SHAFILL_LAYOUT]
    #[arg(long, value_name = "REL")]
    pub layout: Option<String>,

    /// Directory to create staging areas in (defaults to the system temp dir)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Leave staging areas on disk after hashing
    #[arg(long)]
    pub keep_staging: bool,

    /// List records missing a hash without fetching or writing
    #[arg(long)]
    pub dry_run: bool,

    /// Emit debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn parses_positional_manifest_and_flags() {
        let args = RootArgs::try_parse_from([
            "shafill",
            "deps.json",
            "--hash-command",
            "nix hash path --type sha256",
            "--dry-run",
        ])
        .expect("parse args");
        assert_eq!(args.manifest, PathBuf::from("deps.json"));
        assert_eq!(
            args.hash_command.as_deref(),
            Some("nix hash path --type sha256")
        );
        assert!(args.dry_run);
        assert!(!args.keep_staging);
        assert!(args.fetch_command.is_none());
    }

    #[test]
    fn manifest_is_required() {
        assert!(RootArgs::try_parse_from(["shafill"]).is_err());
    }
}
