//! The build pipeline: one ordered list of fallible steps.
//!
//! Every step reads the same [`BuildConfig`] and [`BuildProfile`]. A step
//! either succeeds and the next one starts, or its error ends the run. There
//! is no rollback; a failed build leaves the install root as it was at the
//! point of failure.

mod timing;

use anyhow::{Context, Result};
use log::info;
use std::fmt;
use std::path::PathBuf;

use crate::artifact::{self, PackagedImage};
use crate::build::{guest_tools, packages, rootfs};
use crate::component::customization_components;
use crate::config::BuildConfig;
use crate::executor;
use crate::preflight;
use crate::process::CommandRunner;
use crate::profile::BuildProfile;
use crate::release;

use timing::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Preflight,
    ResetRoot,
    AcquireRelease,
    InstallPackages,
    Customize,
    GuestTools,
    Package,
}

impl Step {
    /// All steps in execution order.
    pub const ALL: &'static [Step] = &[
        Step::Preflight,
        Step::ResetRoot,
        Step::AcquireRelease,
        Step::InstallPackages,
        Step::Customize,
        Step::GuestTools,
        Step::Package,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Preflight => "Checking host",
            Step::ResetRoot => "Resetting install root",
            Step::AcquireRelease => "Fetching and verifying release package",
            Step::InstallPackages => "Installing packages",
            Step::Customize => "Customizing image",
            Step::GuestTools => "Installing guest tools",
            Step::Package => "Packaging image",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub skip_preflight: bool,
    /// Defaults to [`BuildConfig::download_dir`].
    pub download_dir: Option<PathBuf>,
}

/// What a finished build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub steps: Vec<Step>,
    pub image: PackagedImage,
}

/// Run every step against `config`.
pub fn run_build(
    config: &BuildConfig,
    profile: &BuildProfile,
    runner: &dyn CommandRunner,
    options: &BuildOptions,
) -> Result<BuildOutcome> {
    let total = Timer::start("total");
    let download_dir = options
        .download_dir
        .clone()
        .unwrap_or_else(|| config.download_dir());

    info!(
        "Building {} ({}) into {}",
        config.image_name,
        config.build_date,
        config.install_dir.display()
    );

    let mut steps = Vec::with_capacity(Step::ALL.len());
    let mut release_package = None;
    let mut image = None;

    for &step in Step::ALL {
        if step == Step::Preflight && options.skip_preflight {
            info!("==> {step} (skipped)");
            continue;
        }

        info!("==> {step}");
        let timer = Timer::start(&step.to_string());
        match step {
            Step::Preflight => preflight::run_preflight_or_fail(&profile.paths)?,
            Step::ResetRoot => rootfs::reset_install_root(config.install_dir(), runner)?,
            Step::AcquireRelease => {
                release_package = Some(release::acquire_release_package(
                    config,
                    &profile.signing,
                    runner,
                    &download_dir,
                )?);
            }
            Step::InstallPackages => {
                let package = release_package
                    .as_deref()
                    .context("release package was not acquired")?;
                packages::install_packages(
                    runner,
                    config.install_dir(),
                    &config.release,
                    package,
                    &profile.packages,
                )?;
            }
            Step::Customize => {
                let components = customization_components(config, profile);
                executor::install_components(config.install_dir(), &components)?;
            }
            Step::GuestTools => guest_tools::install_guest_tools(
                runner,
                &profile.paths.guest_tools,
                config.install_dir(),
            )?,
            Step::Package => image = Some(artifact::package_image(config, &profile.paths)?),
        }
        timer.finish();
        steps.push(step);
    }

    total.finish();
    let image = image.context("packaging step did not run")?;
    info!("Image ready: {}", image.archive.display());
    Ok(BuildOutcome { steps, image })
}
