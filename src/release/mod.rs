//! Release package acquisition and verification.
//!
//! The release package (`fedora-release-*.noarch.rpm`) carries the repo
//! definitions and GPG keys for the target release. It is fetched from the
//! mirror, and its signature is checked against the host rpm database after
//! the allow-listed Fedora keys have been imported.

pub mod download;
pub mod keys;

use anyhow::{bail, Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::process::{Cmd, CommandRunner};
use crate::profile::SigningPolicy;

/// Fetch the release package into `download_dir`.
pub fn download_release_package(config: &BuildConfig, download_dir: &Path) -> Result<PathBuf> {
    let file_name = Path::new(&config.release_package)
        .file_name()
        .with_context(|| format!("invalid release package name '{}'", config.release_package))?;
    let dest = download_dir.join(file_name);

    if download_dir.exists() {
        fs::remove_dir_all(download_dir).with_context(|| {
            format!("removing stale download directory '{}'", download_dir.display())
        })?;
    }

    let url = config.release_package_url();
    info!("  fetching {url}");
    download::download_to_file(&url, &dest)?;

    let (sha256, size) = download::sha256_file(&dest)?;
    info!("  {} ({} bytes, sha256 {})", dest.display(), size, sha256);
    Ok(dest)
}

/// Check the package signature with `rpm -K`.
///
/// Older rpm releases exit zero while printing `NOT OK` for an unknown key,
/// so the report is checked as well.
pub fn verify_release_package(runner: &dyn CommandRunner, package: &Path) -> Result<()> {
    let result = Cmd::new("rpm")
        .arg("-K")
        .arg_path(package)
        .error_msg(format!(
            "signature verification failed for '{}'",
            package.display()
        ))
        .run_with(runner)?;

    let report = result.stdout_trimmed();
    if report.contains("NOT OK") || report.contains("MISSING KEYS") {
        bail!(
            "signature verification failed for '{}':\n{}",
            package.display(),
            report
        );
    }
    info!("  {}", report);
    Ok(())
}

/// Download, trust keys, verify. Returns the verified package path.
pub fn acquire_release_package(
    config: &BuildConfig,
    policy: &SigningPolicy,
    runner: &dyn CommandRunner,
    download_dir: &Path,
) -> Result<PathBuf> {
    let package = download_release_package(config, download_dir)?;
    keys::ensure_signing_keys(runner, policy)?;
    verify_release_package(runner, &package)?;
    Ok(package)
}
