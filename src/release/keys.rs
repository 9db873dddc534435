//! Fedora signing key allow-list and host trust queries.
//!
//! Trust lives in the host rpm database: a key is trusted when the
//! `gpg-pubkey-<id>` pseudo-package is installed. Checking is an explicit
//! boolean query; importing fetches the armored key from the key URL.

use anyhow::Result;
use log::info;
use serde::Deserialize;
use std::fmt;

use crate::process::{Cmd, CommandRunner};
use crate::profile::SigningPolicy;

/// An 8 hex digit rpm key id, stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct SigningKey(String);

impl SigningKey {
    pub fn parse(id: &str) -> Result<Self, String> {
        let id = id.trim();
        if id.len() != 8 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("signing key id must be 8 hex digits, got '{id}'"));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Name of the rpm pseudo-package that records the imported key.
    pub fn package_name(&self) -> String {
        format!("gpg-pubkey-{}", self.0)
    }

    /// Expand a `{key}` URL template with the upper-case id.
    pub fn url(&self, template: &str) -> String {
        template.replace("{key}", &self.0.to_ascii_uppercase())
    }
}

impl TryFrom<String> for SigningKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the host rpm database already trusts `key`.
///
/// A non-zero exit from `rpm -q` means "not installed", not an error.
pub fn is_key_trusted(runner: &dyn CommandRunner, key: &SigningKey) -> Result<bool> {
    let result = Cmd::new("rpm")
        .arg("-q")
        .arg(key.package_name())
        .allow_fail()
        .run_with(runner)?;
    Ok(result.success())
}

/// Import `key` into the host rpm database from the policy's key URL.
pub fn import_key(runner: &dyn CommandRunner, key: &SigningKey, url_template: &str) -> Result<()> {
    let url = key.url(url_template);
    Cmd::new("rpm")
        .arg("--import")
        .arg(&url)
        .error_msg(format!("importing signing key {key} from {url}"))
        .run_with(runner)?;
    Ok(())
}

/// Import every allow-listed key the host does not trust yet.
///
/// Returns how many keys were imported.
pub fn ensure_signing_keys(runner: &dyn CommandRunner, policy: &SigningPolicy) -> Result<usize> {
    let mut imported = 0;
    for key in &policy.keys {
        if is_key_trusted(runner, key)? {
            info!("  signing key {key} already trusted");
            continue;
        }
        info!("  importing signing key {key}");
        import_key(runner, key, &policy.key_url)?;
        imported += 1;
    }
    Ok(imported)
}
