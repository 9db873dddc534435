//! Host preflight checks.
//!
//! Run before the install root is wiped so a host missing `dnf` or a
//! checkout missing its guest tools fails without destroying anything.

use anyhow::{bail, Result};
use log::{error, info};

use crate::build::guest_tools;
use crate::profile::ProfilePaths;

/// Host tools the build drives. Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("rpm", "rpm"), ("dnf", "dnf")];

/// Result of a single preflight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub details: String,
}

impl CheckResult {
    fn pass(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            details: details.into(),
        }
    }

    fn fail(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn fail_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn log(&self) {
        for check in &self.checks {
            if check.passed {
                info!("  [PASS] {}: {}", check.name, check.details);
            } else {
                error!("  [FAIL] {}: {}", check.name, check.details);
            }
        }
    }
}

pub fn check_tools(tools: &[(&str, &str)]) -> Vec<CheckResult> {
    tools
        .iter()
        .map(|(tool, package)| match which::which(tool) {
            Ok(path) => CheckResult::pass(tool, path.display().to_string()),
            Err(_) => CheckResult::fail(tool, format!("not found on PATH (install: {package})")),
        })
        .collect()
}

pub fn check_inputs(paths: &ProfilePaths) -> Vec<CheckResult> {
    let mut checks = Vec::new();

    let installer = guest_tools::installer_path(&paths.guest_tools);
    checks.push(match guest_tools::check_installer(&paths.guest_tools) {
        Ok(()) => CheckResult::pass("guest tools", installer.display().to_string()),
        Err(e) => CheckResult::fail("guest tools", e.to_string()),
    });

    checks.push(if paths.exclude_file.is_file() {
        CheckResult::pass("exclude file", paths.exclude_file.display().to_string())
    } else {
        CheckResult::fail(
            "exclude file",
            format!("'{}' not found", paths.exclude_file.display()),
        )
    });

    checks
}

pub fn run_preflight(paths: &ProfilePaths) -> PreflightReport {
    let mut checks = check_tools(REQUIRED_TOOLS);
    checks.extend(check_inputs(paths));
    PreflightReport { checks }
}

/// Run preflight and bail if any check fails.
pub fn run_preflight_or_fail(paths: &ProfilePaths) -> Result<()> {
    let report = run_preflight(paths);
    report.log();
    if !report.all_passed() {
        bail!(
            "preflight failed: {} check(s) failed, nothing was changed",
            report.fail_count()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_tools_names_package() {
        let checks = check_tools(&[("sh", "bash"), ("nonexistent_command_xyz", "fake-package")]);
        assert!(checks[0].passed);
        assert!(!checks[1].passed);
        assert!(checks[1].details.contains("fake-package"));
    }

    #[test]
    fn test_inputs_missing() {
        let temp = TempDir::new().unwrap();
        let paths = ProfilePaths {
            guest_tools: temp.path().join("guesttools"),
            exclude_file: temp.path().join("exclude.txt"),
            output_dir: temp.path().to_path_buf(),
        };
        let checks = check_inputs(&paths);
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| !c.passed));
    }

    #[test]
    fn test_inputs_present() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("guesttools")).unwrap();
        fs::write(temp.path().join("guesttools/install.sh"), "#!/bin/sh\n").unwrap();
        fs::write(temp.path().join("exclude.txt"), "dev/*\n").unwrap();

        let paths = ProfilePaths {
            guest_tools: temp.path().join("guesttools"),
            exclude_file: temp.path().join("exclude.txt"),
            output_dir: temp.path().to_path_buf(),
        };
        assert!(check_inputs(&paths).iter().all(|c| c.passed));
    }

    #[test]
    fn test_report_counts_failures() {
        let report = PreflightReport {
            checks: vec![
                CheckResult::pass("rpm", "/usr/bin/rpm"),
                CheckResult::fail("dnf", "not found"),
            ],
        };
        assert!(!report.all_passed());
        assert_eq!(report.fail_count(), 1);
    }
}
