//! Package installation into the install root.
//!
//! Every rpm call carries `--root` and every dnf call carries
//! `--installroot`; nothing here touches the host package set.

use anyhow::Result;
use log::info;
use std::path::Path;

use crate::process::{Cmd, CommandRunner};
use crate::profile::PackageSet;

/// A dnf invocation scoped to one install root and release.
struct Dnf<'a> {
    install_dir: &'a Path,
    release: &'a str,
}

impl Dnf<'_> {
    fn cmd(&self) -> Cmd {
        Cmd::new("dnf")
            .arg(format!("--installroot={}", self.install_dir.display()))
            .arg(format!("--releasever={}", self.release))
            .arg("--setopt=install_weak_deps=False")
            .arg("-y")
            .streaming()
    }
}

/// Install the verified release package without dependency resolution.
pub fn install_release_package(
    runner: &dyn CommandRunner,
    install_dir: &Path,
    package: &Path,
) -> Result<()> {
    Cmd::new("rpm")
        .arg("--root")
        .arg_path(install_dir)
        .arg("--nodeps")
        .arg("-i")
        .arg_path(package)
        .error_msg(format!("installing release package '{}'", package.display()))
        .run_with(runner)?;
    Ok(())
}

/// Release package, package group, extras, update, then cache clean.
pub fn install_packages(
    runner: &dyn CommandRunner,
    install_dir: &Path,
    release: &str,
    release_package: &Path,
    packages: &PackageSet,
) -> Result<()> {
    let dnf = Dnf {
        install_dir,
        release,
    };

    info!("  installing release package");
    install_release_package(runner, install_dir, release_package)?;

    info!("  installing group '{}'", packages.group);
    let mut group = dnf.cmd().arg("groupinstall").arg(&packages.group);
    if !packages.exclude.is_empty() {
        group = group.arg(format!("--exclude={}", packages.exclude.join(",")));
    }
    group
        .error_msg(format!("installing package group '{}'", packages.group))
        .run_with(runner)?;

    if !packages.extra.is_empty() {
        info!("  installing {}", packages.extra.join(" "));
        dnf.cmd()
            .arg("install")
            .args(&packages.extra)
            .error_msg("installing extra packages")
            .run_with(runner)?;
    }

    info!("  applying updates");
    dnf.cmd()
        .arg("update")
        .error_msg("updating install root")
        .run_with(runner)?;

    info!("  cleaning package cache");
    dnf.cmd()
        .args(["clean", "all"])
        .error_msg("cleaning dnf cache")
        .run_with(runner)?;
    Ok(())
}
