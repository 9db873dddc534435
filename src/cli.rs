//! Command-line front end.
//!
//! ```bash
//! fedora-lx-builder -d /data/fedora-39 \
//!     -m https://dl.fedoraproject.org/pub/fedora/linux/releases/39/Everything/x86_64/os/Packages/f \
//!     -R 39 -r fedora-release-39-36.noarch.rpm \
//!     -i fedora-39 -p "Fedora 39 64-bit" -D "Container-native Fedora 39"
//! ```
//!
//! Exit codes: `0` on success, on `-h`, and on an unrecognized flag (usage is
//! printed); `1` when run without arguments, when configuration is invalid,
//! or when a build step fails.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::error;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{build_date_today, BuildArgs, BuildConfig};
use crate::pipeline::{self, BuildOptions, BuildOutcome};
use crate::process::{CommandRunner, HostRunner};
use crate::profile::BuildProfile;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "fedora-lx-builder")]
#[command(version, about = "Build a Fedora image archive for lx-branded zones", long_about = None)]
pub struct Cli {
    /// Directory the image root is built in (wiped first)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub install_dir: Option<String>,

    /// Mirror URL the release package is fetched from
    #[arg(short = 'm', long, value_name = "URL")]
    pub mirror: Option<String>,

    /// Fedora release version, e.g. 39
    #[arg(short = 'R', long, value_name = "VERSION")]
    pub release: Option<String>,

    /// Release package file name on the mirror
    #[arg(short = 'r', long, value_name = "RPM")]
    pub release_package: Option<String>,

    /// Image name, used for the archive file name
    #[arg(short = 'i', long, value_name = "NAME")]
    pub image_name: Option<String>,

    /// Human readable image name
    #[arg(short = 'p', long, value_name = "NAME")]
    pub display_name: Option<String>,

    /// Image description
    #[arg(short = 'D', long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Documentation URL
    #[arg(short = 'u', long, value_name = "URL")]
    pub docs_url: Option<String>,

    /// TOML build profile overriding packages and customization
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Guest tools checkout containing install.sh
    #[arg(long, value_name = "DIR")]
    pub guest_tools: Option<PathBuf>,

    /// tar-style exclusion list for the archive
    #[arg(long, value_name = "FILE")]
    pub exclude_file: Option<PathBuf>,

    /// Where the archive and manifest are written
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip host tool and input checks
    #[arg(long)]
    pub skip_preflight: bool,
}

impl Cli {
    pub fn build_args(&self) -> BuildArgs {
        BuildArgs {
            install_dir: self.install_dir.clone(),
            mirror: self.mirror.clone(),
            release: self.release.clone(),
            release_package: self.release_package.clone(),
            image_name: self.image_name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            docs_url: self.docs_url.clone(),
        }
    }
}

/// Result of parsing the command line.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Build(Box<Cli>),
    /// Nothing to build; exit with this code.
    Exit(u8),
}

fn usage() -> String {
    Cli::command().render_help().to_string()
}

fn print_usage() {
    eprintln!("{}", usage());
}

/// The offending flag followed by the full usage text.
fn unknown_argument_report(e: &clap::Error) -> String {
    let rendered = e.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    format!("{first}\n\n{}", usage())
}

/// Parse `args` (including the program name).
pub fn parse<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        print_usage();
        return Invocation::Exit(1);
    }

    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Build(Box::new(cli)),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                Invocation::Exit(0)
            }
            // Unknown flags print usage but are not treated as failures.
            ErrorKind::UnknownArgument => {
                eprintln!("{}", unknown_argument_report(&e));
                Invocation::Exit(0)
            }
            _ => {
                let _ = e.print();
                Invocation::Exit(1)
            }
        },
    }
}

/// Validate, load the profile and run every step.
pub fn execute(
    cli: &Cli,
    config: &BuildConfig,
    runner: &dyn CommandRunner,
) -> Result<BuildOutcome> {
    let profile = BuildProfile::load(cli.profile.as_deref())?.with_path_overrides(
        cli.guest_tools.clone(),
        cli.exclude_file.clone(),
        cli.output_dir.clone(),
    );
    let options = BuildOptions {
        skip_preflight: cli.skip_preflight,
        download_dir: None,
    };
    pipeline::run_build(config, &profile, runner, &options)
}

/// Entry point shared by the binary; returns the process exit code.
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    run_with(args, &HostRunner)
}

pub fn run_with<I, T>(args: I, runner: &dyn CommandRunner) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match parse(args) {
        Invocation::Build(cli) => cli,
        Invocation::Exit(code) => return code,
    };

    let config = match BuildConfig::from_args(cli.build_args(), build_date_today()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}\n");
            print_usage();
            return 1;
        }
    };

    match execute(&cli, &config, runner) {
        Ok(_) => 0,
        Err(e) => {
            error!("build failed: {e:#}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn full_argv(install_dir: &str) -> Vec<String> {
        [
            "fedora-lx-builder",
            "-d",
            install_dir,
            "-m",
            "https://mirror.test/f",
            "-R",
            "39",
            "-r",
            "fedora-release-39-36.noarch.rpm",
            "-i",
            "fedora-39",
            "-p",
            "Fedora 39 64-bit",
            "-D",
            "Container-native Fedora 39",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_no_arguments_exits_nonzero() {
        assert_eq!(parse(["fedora-lx-builder"]), Invocation::Exit(1));
    }

    #[test]
    fn test_unknown_flag_exits_zero() {
        assert_eq!(parse(["fedora-lx-builder", "-x"]), Invocation::Exit(0));
        assert_eq!(parse(["fedora-lx-builder", "--bogus"]), Invocation::Exit(0));
    }

    #[test]
    fn test_unknown_flag_reports_full_usage() {
        let err = Cli::try_parse_from(["fedora-lx-builder", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let report = unknown_argument_report(&err);
        assert!(report.lines().next().unwrap().contains("--bogus"));
        for flag in ["--install-dir", "--release-package", "--skip-preflight"] {
            assert!(report.contains(flag), "{flag} missing from usage");
        }
    }

    #[test]
    fn test_help_exits_zero() {
        assert_eq!(parse(["fedora-lx-builder", "-h"]), Invocation::Exit(0));
    }

    #[test]
    fn test_flags_map_to_build_args() {
        let Invocation::Build(cli) = parse(full_argv("/data/root/")) else {
            panic!("expected a build invocation");
        };
        let args = cli.build_args();
        assert_eq!(args.install_dir.as_deref(), Some("/data/root/"));
        assert_eq!(args.release.as_deref(), Some("39"));
        assert_eq!(args.display_name.as_deref(), Some("Fedora 39 64-bit"));
        assert_eq!(args.docs_url, None);
        assert!(!cli.skip_preflight);
    }

    #[test]
    fn test_long_flags() {
        let Invocation::Build(cli) = parse([
            "fedora-lx-builder",
            "--install-dir",
            "/data/root",
            "--docs-url",
            "https://docs.example.test",
            "--exclude-file",
            "/etc/lx/exclude.txt",
            "--skip-preflight",
        ]) else {
            panic!("expected a build invocation");
        };
        assert_eq!(cli.docs_url.as_deref(), Some("https://docs.example.test"));
        assert_eq!(cli.exclude_file, Some(PathBuf::from("/etc/lx/exclude.txt")));
        assert!(cli.skip_preflight);
    }

    #[test]
    fn test_missing_field_fails_before_any_command() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("keep"), "x").unwrap();

        let mut argv = full_argv(&temp.path().display().to_string());
        let at = argv.iter().position(|a| a == "-i").unwrap();
        argv.drain(at..at + 2);

        let runner = RecordingRunner::succeeding();
        assert_eq!(run_with(argv, &runner), 1);
        assert!(runner.calls().is_empty());
        assert!(temp.path().join("keep").exists());
    }

    #[test]
    fn test_missing_install_dir_fails() {
        let runner = RecordingRunner::succeeding();
        assert_eq!(run_with(full_argv("/nonexistent_path_12345"), &runner), 1);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_preflight_failure_leaves_root_alone() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("keep"), "x").unwrap();

        let mut argv = full_argv(&root.display().to_string());
        argv.push("--guest-tools".into());
        argv.push(temp.path().join("missing").display().to_string());

        let runner = RecordingRunner::succeeding();
        assert_eq!(run_with(argv, &runner), 1);
        assert!(root.join("keep").exists());
    }

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
