//! Install root reset and rpm database initialization.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::process::{Cmd, CommandRunner};

/// Wipe `install_dir`, recreate it empty, and initialize an rpm database in it.
///
/// Prior contents are always discarded; a rerun starts from nothing.
pub fn reset_install_root(install_dir: &Path, runner: &dyn CommandRunner) -> Result<()> {
    if install_dir.exists() || install_dir.is_symlink() {
        fs::remove_dir_all(install_dir).with_context(|| {
            format!(
                "removing existing install root '{}'",
                install_dir.display()
            )
        })?;
    }
    fs::create_dir_all(install_dir.join("var/lib/rpm")).with_context(|| {
        format!("creating install root '{}'", install_dir.display())
    })?;

    Cmd::new("rpm")
        .arg("--root")
        .arg_path(install_dir)
        .arg("--initdb")
        .error_msg(format!(
            "initializing rpm database in '{}'",
            install_dir.display()
        ))
        .run_with(runner)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::RecordingRunner;
    use tempfile::TempDir;

    #[test]
    fn test_reset_discards_prior_contents() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("etc")).unwrap();
        fs::write(root.join("etc/stale.conf"), "old").unwrap();

        let runner = RecordingRunner::succeeding();
        reset_install_root(&root, &runner).unwrap();

        assert!(!root.join("etc/stale.conf").exists());
        assert!(!root.join("etc").exists());
        assert!(root.join("var/lib/rpm").is_dir());
        assert_eq!(
            runner.rendered(),
            vec![format!("rpm --root {} --initdb", root.display())]
        );
    }

    #[test]
    fn test_initdb_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(&root).unwrap();

        let runner = RecordingRunner::with(|_| (1, String::new()));
        let err = reset_install_root(&root, &runner).unwrap_err();
        assert!(err.to_string().contains("initializing rpm database"));
    }
}
