//! Declarative customization of the install root.
//!
//! Components describe WHAT ends up in the image as a list of [`Op`]s; the
//! [`crate::executor`] interprets them against the install root. Paths in
//! ops are always relative to that root.
//!
//! # Example
//!
//! ```rust
//! use fedora_lx_builder::component::{Installable, Op, Phase};
//!
//! struct Hostname;
//!
//! impl Installable for Hostname {
//!     fn name(&self) -> &str { "Hostname" }
//!     fn phase(&self) -> Phase { Phase::System }
//!     fn ops(&self) -> Vec<Op> {
//!         vec![Op::WriteFile("etc/hostname".into(), "zone\n".into())]
//!     }
//! }
//! ```

pub mod definitions;

use std::fmt;

pub use definitions::customization_components;

/// Anything the executor can install.
pub trait Installable {
    /// Name for logging and identification.
    fn name(&self) -> &str;

    /// Components are applied in phase order.
    fn phase(&self) -> Phase;

    /// Generate the operations to perform.
    fn ops(&self) -> Vec<Op>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Timezone and locale.
    System = 1,
    /// systemd unit drop-ins.
    Services = 2,
    /// Remote access policy.
    Access = 3,
    /// MOTD and product metadata.
    Branding = 4,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::System => write!(f, "System"),
            Phase::Services => write!(f, "Services"),
            Phase::Access => write!(f, "Access"),
            Phase::Branding => write!(f, "Branding"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Write a file with given content, replacing any existing file.
    WriteFile(String, String),

    /// Write a file with specific permissions (mode as octal).
    WriteFileMode(String, String, u32),

    /// Create a symlink (link_path, target), replacing whatever is there.
    Symlink(String, String),

    /// Append `content` to a file unless a line equal to `marker` is
    /// already present. The marker line is written before the content.
    AppendBlock {
        path: String,
        marker: String,
        content: String,
    },
}

/// Write a file.
pub fn write_file(path: impl Into<String>, content: impl Into<String>) -> Op {
    Op::WriteFile(path.into(), content.into())
}

/// Write a file with permissions.
pub fn write_file_mode(path: impl Into<String>, content: impl Into<String>, mode: u32) -> Op {
    Op::WriteFileMode(path.into(), content.into(), mode)
}

/// Create a symlink.
pub fn symlink(link: impl Into<String>, target: impl Into<String>) -> Op {
    Op::Symlink(link.into(), target.into())
}

/// Append a marked block.
pub fn append_block(
    path: impl Into<String>,
    marker: impl Into<String>,
    content: impl Into<String>,
) -> Op {
    Op::AppendBlock {
        path: path.into(),
        marker: marker.into(),
        content: content.into(),
    }
}
