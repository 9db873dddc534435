//! Build profile: package selection and customization knobs.
//!
//! The defaults are the Fedora lx image recipe. A TOML file passed with
//! `--profile` may override any field; omitted fields keep their default.
//!
//! ```toml
//! [packages]
//! group = "Minimal Install"
//! extra = ["vim-minimal", "wget", "tmux"]
//!
//! [paths]
//! output_dir = "out"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::release::keys::SigningKey;

/// Package group installed into the root.
pub const DEFAULT_GROUP: &str = "Fedora Server Edition";

/// Packages excluded from the group install. Zones share the host kernel
/// and have no bootloader, firmware or local firewall.
pub const DEFAULT_GROUP_EXCLUDES: &[&str] = &[
    "kernel*",
    "linux-firmware",
    "*-firmware",
    "grub2*",
    "shim*",
    "efibootmgr",
    "dracut*",
    "plymouth*",
    "firewalld",
    "smartmontools",
    "microcode_ctl",
];

pub const DEFAULT_EXTRA_PACKAGES: &[&str] = &["vim-minimal", "wget"];

/// Fedora 37, 38 and 39 primary signing keys.
pub const DEFAULT_SIGNING_KEYS: &[&str] = &["5323552a", "eb10b464", "18b8e74c"];

/// `{key}` is replaced with the upper-case key id.
pub const DEFAULT_KEY_URL: &str = "https://getfedora.org/static/keys/{key}.txt";

/// Host-integration services whose systemd sandboxing is relaxed.
pub const DEFAULT_SANDBOXED_SERVICES: &[&str] = &[
    "systemd-hostnamed",
    "systemd-localed",
    "systemd-logind",
    "systemd-timedated",
    "systemd-resolved",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildProfile {
    pub packages: PackageSet,
    pub signing: SigningPolicy,
    pub customize: Customization,
    pub paths: ProfilePaths,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSet {
    pub group: String,
    pub exclude: Vec<String>,
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningPolicy {
    pub keys: Vec<SigningKey>,
    pub key_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Customization {
    pub timezone: String,
    pub locale: String,
    pub sandboxed_services: Vec<String>,
    pub web_service: Option<String>,
    pub sshd_directives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilePaths {
    /// Checkout of the guest-tools submodule.
    pub guest_tools: PathBuf,
    /// tar-style exclusion list applied when archiving.
    pub exclude_file: PathBuf,
    /// Where the archive and its manifest are written.
    pub output_dir: PathBuf,
}

impl Default for PackageSet {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            exclude: to_strings(DEFAULT_GROUP_EXCLUDES),
            extra: to_strings(DEFAULT_EXTRA_PACKAGES),
        }
    }
}

impl Default for SigningPolicy {
    fn default() -> Self {
        Self {
            keys: DEFAULT_SIGNING_KEYS
                .iter()
                .filter_map(|id| SigningKey::parse(id).ok())
                .collect(),
            key_url: DEFAULT_KEY_URL.to_string(),
        }
    }
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            locale: "en_US.UTF-8".to_string(),
            sandboxed_services: to_strings(DEFAULT_SANDBOXED_SERVICES),
            web_service: Some("httpd".to_string()),
            sshd_directives: to_strings(&[
                "PasswordAuthentication no",
                "PermitRootLogin prohibit-password",
                "UseDNS no",
            ]),
        }
    }
}

impl Default for ProfilePaths {
    fn default() -> Self {
        Self {
            guest_tools: PathBuf::from("guesttools"),
            exclude_file: PathBuf::from("exclude.txt"),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for BuildProfile {
    fn default() -> Self {
        Self {
            packages: PackageSet::default(),
            signing: SigningPolicy::default(),
            customize: Customization::default(),
            paths: ProfilePaths::default(),
        }
    }
}

impl BuildProfile {
    /// Load the profile at `path`, or the defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading build profile '{}'", path.display()))?;
        let profile = Self::parse(&raw)
            .with_context(|| format!("parsing build profile '{}'", path.display()))?;
        Ok(profile)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let profile: Self = toml::from_str(raw)?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<()> {
        if self.packages.group.trim().is_empty() {
            bail!("packages.group must not be empty");
        }
        if self.signing.keys.is_empty() {
            bail!("signing.keys must list at least one key id");
        }
        if !self.signing.key_url.contains("{key}") {
            bail!(
                "signing.key_url must contain a '{{key}}' placeholder, got '{}'",
                self.signing.key_url
            );
        }
        if self.customize.timezone.contains("..") || self.customize.timezone.starts_with('/') {
            bail!(
                "customize.timezone must be a zoneinfo name, got '{}'",
                self.customize.timezone
            );
        }
        for service in &self.customize.sandboxed_services {
            if service.is_empty() || service.contains('/') {
                bail!("invalid service name in customize.sandboxed_services: '{service}'");
            }
        }
        if let Some(service) = &self.customize.web_service {
            if service.is_empty() || service.contains('/') {
                bail!("invalid service name in customize.web_service: '{service}'");
            }
        }
        Ok(())
    }

    /// Point the guest tools, exclude file or output directory somewhere else.
    pub fn with_path_overrides(
        mut self,
        guest_tools: Option<PathBuf>,
        exclude_file: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = guest_tools {
            self.paths.guest_tools = dir;
        }
        if let Some(file) = exclude_file {
            self.paths.exclude_file = file;
        }
        if let Some(dir) = output_dir {
            self.paths.output_dir = dir;
        }
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
