//! Builds Fedora image archives for lx-branded zones.
//!
//! A build wipes an install root, bootstraps an rpm database in it, installs
//! a signature-verified Fedora release through `dnf --installroot`, applies
//! the zone customizations, runs the guest tools installer, and packs the
//! result as `<image-name>-<YYYYMMDD>.tar.gz`.
//!
//! - **Configuration** - [`config`] validates flags, [`profile`] holds the
//!   package and customization knobs (defaults or a TOML file)
//! - **Release trust** - [`release`] fetches the release package and checks it
//!   against the allow-listed signing keys
//! - **Install root** - [`build`] resets the root and drives rpm/dnf
//! - **Customization** - [`component`] declares file ops, [`executor`] applies them
//! - **Packaging** - [`artifact`] writes the tarball and its manifest
//!
//! # Architecture
//!
//! ```text
//! cli ──> config ──> pipeline
//!                     │
//!                     ├── preflight
//!                     ├── build::rootfs
//!                     ├── release (download, keys, rpm -K)
//!                     ├── build::packages
//!                     ├── component ──> executor
//!                     ├── build::guest_tools
//!                     └── artifact (tar.gz + manifest)
//! ```
//!
//! Every external command goes through [`process::CommandRunner`].

pub mod artifact;
pub mod build;
pub mod cli;
pub mod component;
pub mod config;
pub mod executor;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod profile;
pub mod release;

pub use component::{Installable, Op, Phase};
pub use config::{BuildConfig, ConfigError};
pub use pipeline::{run_build, BuildOptions, Step};
pub use profile::BuildProfile;
