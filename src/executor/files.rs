//! File operation handlers: Op::WriteFile, Op::WriteFileMode, Op::Symlink,
//! Op::AppendBlock

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::resolve;

fn prepare(root: &Path, path: &str) -> Result<PathBuf> {
    let full_path = resolve(root, path)?;
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(full_path)
}

/// Handle Op::WriteFile: Write a file with content
pub fn handle_writefile(root: &Path, path: &str, content: &str) -> Result<()> {
    let full_path = prepare(root, path)?;
    fs::write(&full_path, content)
        .with_context(|| format!("writing {}", full_path.display()))?;
    Ok(())
}

/// Handle Op::WriteFileMode: Write a file with specific permissions
pub fn handle_writefilemode(root: &Path, path: &str, content: &str, mode: u32) -> Result<()> {
    let full_path = prepare(root, path)?;
    fs::write(&full_path, content)
        .with_context(|| format!("writing {}", full_path.display()))?;
    fs::set_permissions(&full_path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Handle Op::Symlink: Create a symlink
///
/// Packages ship `/etc/localtime` as a regular file or a link to another
/// zone, so whatever sits at the link path is replaced.
pub fn handle_symlink(root: &Path, link: &str, target: &str) -> Result<()> {
    let link_path = prepare(root, link)?;
    if link_path.is_symlink() || link_path.exists() {
        fs::remove_file(&link_path)
            .with_context(|| format!("removing {}", link_path.display()))?;
    }
    std::os::unix::fs::symlink(target, &link_path)
        .with_context(|| format!("linking {} -> {}", link_path.display(), target))?;
    Ok(())
}

/// Handle Op::AppendBlock: Append `marker` and `content` unless the marker
/// line is already present. Returns whether anything was written.
pub fn handle_append_block(root: &Path, path: &str, marker: &str, content: &str) -> Result<bool> {
    let full_path = prepare(root, path)?;

    let existing = match fs::read_to_string(&full_path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", full_path.display()));
        }
    };

    if existing.lines().any(|line| line == marker) {
        return Ok(false);
    }

    let mut block = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        block.push('\n');
    }
    block.push('\n');
    block.push_str(marker);
    block.push('\n');
    block.push_str(content);
    if !content.ends_with('\n') {
        block.push('\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&full_path)
        .with_context(|| format!("opening {}", full_path.display()))?;
    file.write_all(block.as_bytes())
        .with_context(|| format!("appending to {}", full_path.display()))?;
    Ok(true)
}
