//! Build manifest written next to the archive.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::BuildConfig;
use crate::release::download::sha256_file;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub image_name: String,
    pub display_name: String,
    pub description: String,
    pub docs_url: String,
    pub release: String,
    pub build_date: String,
    pub archive: String,
    pub sha256: String,
    pub size_bytes: u64,
}

impl BuildManifest {
    /// Describe `archive`, hashing it from disk.
    pub fn for_archive(config: &BuildConfig, archive: &Path) -> Result<Self> {
        let (sha256, size_bytes) = sha256_file(archive)?;
        Ok(Self {
            image_name: config.image_name.clone(),
            display_name: config.display_name.clone(),
            description: config.description.clone(),
            docs_url: config.docs_url.clone(),
            release: config.release.clone(),
            build_date: config.build_date.clone(),
            archive: config.archive_name(),
            sha256,
            size_bytes,
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("writing manifest {}", path.display()))?;
        Ok(())
    }
}
