//! Packaging of the finished install root.
//!
//! - [`exclude`] - tar-style exclusion list
//! - [`tarball`] - `.tar.gz` writer
//! - [`manifest`] - JSON build manifest beside the archive

pub mod exclude;
pub mod manifest;
pub mod tarball;

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

pub use exclude::ExcludeList;
pub use manifest::BuildManifest;
pub use tarball::{create_tar_gz, ArchiveStats};

use crate::config::BuildConfig;
use crate::profile::ProfilePaths;

/// Paths of a packaged image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedImage {
    pub archive: PathBuf,
    pub manifest: PathBuf,
}

/// Archive the install root and write its manifest into the output directory.
pub fn package_image(config: &BuildConfig, paths: &ProfilePaths) -> Result<PackagedImage> {
    let excludes = ExcludeList::load(&paths.exclude_file)?;
    info!(
        "  {} exclusion patterns from {}",
        excludes.len(),
        paths.exclude_file.display()
    );

    let archive = paths.output_dir.join(config.archive_name());
    let stats = create_tar_gz(config.install_dir(), &archive, &excludes)
        .with_context(|| format!("creating {}", archive.display()))?;
    info!(
        "  {} files, {} directories, {} symlinks, {} hard links ({} excluded, {} skipped)",
        stats.files, stats.dirs, stats.symlinks, stats.hardlinks, stats.excluded, stats.skipped
    );

    let manifest_path = paths.output_dir.join(config.manifest_name());
    let manifest = BuildManifest::for_archive(config, &archive)?;
    manifest.write(&manifest_path)?;
    info!(
        "  {} ({} bytes, sha256 {})",
        archive.display(),
        manifest.size_bytes,
        manifest.sha256
    );

    Ok(PackagedImage {
        archive,
        manifest: manifest_path,
    })
}
