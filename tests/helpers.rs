//! Shared test utilities for image build tests.

#![allow(dead_code)]

use anyhow::Result;
use fedora_lx_builder::process::{Cmd, CommandResult, CommandRunner};
use flate2::read::GzDecoder;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tempfile::TempDir;

pub const RELEASE_PACKAGE: &str = "fedora-release-39-36.noarch.rpm";

/// Scratch layout for a build: mirror, guest tools, exclude file, install
/// root and output directory.
pub struct TestEnv {
    pub _temp_dir: TempDir,
    pub base: PathBuf,
    pub mirror: PathBuf,
    pub guest_tools: PathBuf,
    pub exclude_file: PathBuf,
    pub install_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestEnv {
    pub fn new(exclude: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path().to_path_buf();

        let mirror = base.join("mirror");
        fs::create_dir_all(&mirror).unwrap();
        fs::write(mirror.join(RELEASE_PACKAGE), b"release rpm").unwrap();

        let guest_tools = base.join("guesttools");
        fs::create_dir_all(&guest_tools).unwrap();
        fs::write(guest_tools.join("install.sh"), "#!/bin/sh\n").unwrap();

        let exclude_file = base.join("exclude.txt");
        fs::write(&exclude_file, exclude).unwrap();

        let install_dir = base.join("root");
        fs::create_dir_all(&install_dir).unwrap();

        Self {
            mirror,
            guest_tools,
            exclude_file,
            install_dir,
            output_dir: base.join("out"),
            base,
            _temp_dir: temp_dir,
        }
    }

    pub fn mirror_url(&self) -> String {
        format!("file://{}", self.mirror.display())
    }
}

/// Stands in for rpm, dnf and the guest tools installer.
///
/// dnf calls populate the install root with a few files a real install
/// would leave behind, so exclusion has something to act on.
pub struct FakeHost {
    install_dir: PathBuf,
    pub calls: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new(install_dir: &Path) -> Self {
        Self {
            install_dir: install_dir.to_path_buf(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn populate(&self) -> Result<()> {
        let root = &self.install_dir;
        fs::create_dir_all(root.join("etc/ssh"))?;
        fs::create_dir_all(root.join("usr/share/zoneinfo"))?;
        fs::create_dir_all(root.join("var/cache/dnf/fedora-39"))?;
        fs::create_dir_all(root.join("var/log"))?;
        fs::write(root.join("etc/ssh/sshd_config"), "Subsystem sftp internal-sftp\n")?;
        fs::write(root.join("usr/share/zoneinfo/UTC"), "TZif2")?;
        fs::write(root.join("var/cache/dnf/fedora-39/repomd.xml"), "<repomd/>")?;
        fs::write(root.join("var/log/dnf.log"), "installed\n")?;
        Ok(())
    }
}

impl CommandRunner for FakeHost {
    fn execute(&self, cmd: &Cmd) -> Result<CommandResult> {
        self.calls.borrow_mut().push(cmd.display());

        let mut stdout = String::new();
        if cmd.program() == "dnf" && cmd.get_args().iter().any(|a| a == "groupinstall") {
            self.populate()?;
        }
        if cmd.get_args().first().map(String::as_str) == Some("-K") {
            stdout.push_str("release.rpm: digests signatures OK\n");
        }

        Ok(CommandResult {
            status: ExitStatus::from_raw(0),
            stdout,
            stderr: String::new(),
        })
    }
}

/// Regular file contents by member name; directories and links map to "".
pub fn read_archive(path: &Path) -> BTreeMap<String, String> {
    let file = File::open(path).expect("archive should exist");
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut members = BTreeMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry
            .path()
            .unwrap()
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        let mut data = String::new();
        if entry.header().entry_type() == tar::EntryType::Regular {
            entry.read_to_string(&mut data).unwrap();
        }
        members.insert(name, data);
    }
    members
}
