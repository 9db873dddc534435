//! Build configuration: the validated, immutable record every step reads.
//!
//! Raw flag values arrive as [`BuildArgs`] (all optional so that validation
//! happens here, with one error per missing field). [`BuildConfig::from_args`]
//! is the only constructor and runs before anything touches the filesystem.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;

/// Docs URL used when `-u` is not given.
pub const DEFAULT_DOCS_URL: &str = "https://docs.joyent.com/images/container-native-linux";

/// Errors raised while validating command-line configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required flag was not supplied or was empty.
    #[error("missing required option {flag} ({name})")]
    MissingField {
        flag: &'static str,
        name: &'static str,
    },

    /// The install directory does not exist.
    #[error("install directory {} does not exist", .0.display())]
    InstallDirMissing(PathBuf),

    /// The install directory resolves to the host root.
    #[error("refusing to use '/' as the install directory")]
    InstallDirIsRoot,
}

/// Flag values as parsed, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    pub install_dir: Option<String>,
    pub mirror: Option<String>,
    pub release: Option<String>,
    pub release_package: Option<String>,
    pub image_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub docs_url: Option<String>,
}

/// Validated build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Target directory the rootfs is built in (no trailing slash).
    pub install_dir: PathBuf,
    /// Base URL the release package is fetched from.
    pub mirror: String,
    /// Fedora release version, e.g. `39`.
    pub release: String,
    /// Release package file name under the mirror.
    pub release_package: String,
    /// Image name; prefixes the output archive.
    pub image_name: String,
    /// Human readable name written to MOTD and product file.
    pub display_name: String,
    pub description: String,
    pub docs_url: String,
    /// `YYYYMMDD`
    pub build_date: String,
}

impl BuildConfig {
    /// Validate `args` into a configuration.
    ///
    /// Required fields are checked in flag order so the first missing one is
    /// reported. The install directory must already exist.
    pub fn from_args(args: BuildArgs, build_date: impl Into<String>) -> Result<Self, ConfigError> {
        let install_dir = required(args.install_dir, "-d", "install directory")?;
        let mirror = required(args.mirror, "-m", "mirror")?;
        let release = required(args.release, "-R", "release")?;
        let release_package = required(args.release_package, "-r", "release package")?;
        let image_name = required(args.image_name, "-i", "image name")?;
        let display_name = required(args.display_name, "-p", "display name")?;
        let description = required(args.description, "-D", "description")?;
        let docs_url = args
            .docs_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_DOCS_URL.to_string());

        let stripped = strip_trailing_slash(&install_dir);
        if stripped.is_empty() {
            return Err(ConfigError::InstallDirIsRoot);
        }
        let install_dir = PathBuf::from(stripped);
        if !install_dir.exists() {
            return Err(ConfigError::InstallDirMissing(install_dir));
        }

        Ok(Self {
            install_dir,
            mirror,
            release,
            release_package,
            image_name,
            display_name,
            description,
            docs_url,
            build_date: build_date.into(),
        })
    }

    /// `<image-name>-<YYYYMMDD>.tar.gz`
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tar.gz", self.image_name, self.build_date)
    }

    /// `<image-name>-<YYYYMMDD>.json`, written next to the archive.
    pub fn manifest_name(&self) -> String {
        format!("{}-{}.json", self.image_name, self.build_date)
    }

    /// Full URL of the release package on the mirror.
    pub fn release_package_url(&self) -> String {
        format!(
            "{}/{}",
            self.mirror.trim_end_matches('/'),
            self.release_package.trim_start_matches('/')
        )
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Scratch directory for the release package: `<install-dir>.download`,
    /// beside the install root so the reset step never touches it.
    pub fn download_dir(&self) -> PathBuf {
        let mut dir = self.install_dir.as_os_str().to_owned();
        dir.push(".download");
        PathBuf::from(dir)
    }
}

fn required(
    value: Option<String>,
    flag: &'static str,
    name: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField { flag, name }),
    }
}

/// Strip every trailing `/` (`/data/root/` becomes `/data/root`, `/` becomes empty).
pub fn strip_trailing_slash(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Today's date in UTC as `YYYYMMDD`.
pub fn build_date_today() -> String {
    format_build_date(OffsetDateTime::now_utc())
}

pub fn format_build_date(now: OffsetDateTime) -> String {
    format!("{:04}{:02}{:02}", now.year(), now.month() as u8, now.day())
}
