//! Guest tools installation.
//!
//! The guest tools are a separately maintained checkout (a git submodule)
//! whose `install.sh -i <dir>` installs the platform integration into a root.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::process::{Cmd, CommandRunner};

pub const INSTALLER_SCRIPT: &str = "install.sh";

/// Path of the installer inside the guest tools checkout.
pub fn installer_path(guest_tools: &Path) -> PathBuf {
    guest_tools.join(INSTALLER_SCRIPT)
}

/// Fail with a hint when the checkout is missing its installer.
pub fn check_installer(guest_tools: &Path) -> Result<()> {
    let installer = installer_path(guest_tools);
    if !installer.is_file() {
        bail!(
            "guest tools installer not found at '{}'\n\
             Initialize the submodule: git submodule update --init",
            installer.display()
        );
    }
    Ok(())
}

/// Run the guest tools installer against `install_dir`.
pub fn install_guest_tools(
    runner: &dyn CommandRunner,
    guest_tools: &Path,
    install_dir: &Path,
) -> Result<()> {
    check_installer(guest_tools)?;
    Cmd::new("sh")
        .arg_path(&installer_path(guest_tools))
        .arg("-i")
        .arg_path(install_dir)
        .streaming()
        .error_msg("guest tools installer failed")
        .run_with(runner)?;
    Ok(())
}
