//! Component executor: interprets [`Op`] variants against the install root.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fedora_lx_builder::component::customization_components;
//! use fedora_lx_builder::executor;
//!
//! let components = customization_components(&config, &profile);
//! executor::install_components(config.install_dir(), &components)?;
//! ```

pub mod files;

use anyhow::{bail, Context, Result};
use log::info;
use std::path::{Component, Path, PathBuf};

use crate::component::{Installable, Op};

/// Join an op path onto `root`, refusing anything that would escape it.
pub fn resolve(root: &Path, path: &str) -> Result<PathBuf> {
    let rel = Path::new(path);
    if path.is_empty() {
        bail!("empty path in customization op");
    }
    for component in rel.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => bail!("path '{}' must stay inside the install root", path),
        }
    }
    Ok(root.join(rel))
}

/// Execute a single operation.
pub fn execute_op(root: &Path, op: &Op) -> Result<()> {
    match op {
        Op::WriteFile(path, content) => files::handle_writefile(root, path, content)?,
        Op::WriteFileMode(path, content, mode) => {
            files::handle_writefilemode(root, path, content, *mode)?
        }
        Op::Symlink(link, target) => files::handle_symlink(root, link, target)?,
        Op::AppendBlock {
            path,
            marker,
            content,
        } => {
            files::handle_append_block(root, path, marker, content)?;
        }
    }
    Ok(())
}

/// Apply every component in phase order. Components sharing a phase keep
/// their relative order.
pub fn install_components(root: &Path, components: &[Box<dyn Installable>]) -> Result<()> {
    let mut ordered: Vec<&dyn Installable> = components.iter().map(|c| c.as_ref()).collect();
    ordered.sort_by_key(|c| c.phase());

    for component in ordered {
        info!("  [{}] {}", component.phase(), component.name());
        for op in component.ops() {
            execute_op(root, &op)
                .with_context(|| format!("applying component '{}'", component.name()))?;
        }
    }
    Ok(())
}
