//! Gzip-compressed tarball of the install root.

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::exclude::ExcludeList;

/// Member counts for one archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: u64,
    pub dirs: u64,
    pub symlinks: u64,
    /// Regular files stored as hard links to an earlier member.
    pub hardlinks: u64,
    /// Excluded paths (an excluded directory counts once).
    pub excluded: u64,
    /// Sockets, fifos and device nodes.
    pub skipped: u64,
}

/// Archive everything under `root` into `output` as `.tar.gz`.
///
/// Members are sorted by name, symlinks are stored as links, and ownership,
/// mode and mtime are taken from disk. A file with several names inside the
/// root is stored once; later names become hard-link members pointing at the
/// first one.
pub fn create_tar_gz(root: &Path, output: &Path, excludes: &ExcludeList) -> Result<ArchiveStats> {
    let parent = match output.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("creating output directory '{}'", parent.display()))?;

    let real_root = root
        .canonicalize()
        .with_context(|| format!("resolving {}", root.display()))?;
    let real_output = resolve_output(parent, output)?;
    if real_output.starts_with(&real_root) {
        bail!(
            "archive '{}' would be written inside the tree being archived",
            output.display()
        );
    }

    let out =
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let encoder = GzEncoder::new(BufWriter::new(out), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    let mut stats = ArchiveStats::default();
    // (dev, ino) of multiply-linked files already stored, with their member name.
    let mut linked: HashMap<(u64, u64), PathBuf> = HashMap::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        let path = entry.path();
        let rel = path.strip_prefix(root)?;

        if excludes.is_excluded(rel) {
            debug!("excluding {}", rel.display());
            stats.excluded += 1;
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let md = entry
            .metadata()
            .with_context(|| format!("reading metadata of {}", path.display()))?;
        let mut header = tar::Header::new_gnu();
        header.set_metadata(&md);

        let file_type = md.file_type();
        if file_type.is_dir() {
            builder
                .append_data(&mut header, rel, io::empty())
                .with_context(|| format!("archiving {}", rel.display()))?;
            stats.dirs += 1;
        } else if file_type.is_symlink() {
            let target = fs::read_link(path)
                .with_context(|| format!("reading link {}", path.display()))?;
            builder
                .append_link(&mut header, rel, &target)
                .with_context(|| format!("archiving {}", rel.display()))?;
            stats.symlinks += 1;
        } else if file_type.is_file() {
            let inode = (md.dev(), md.ino());
            if let Some(first) = linked.get(&inode) {
                header.set_entry_type(tar::EntryType::Link);
                header.set_size(0);
                builder
                    .append_link(&mut header, rel, first)
                    .with_context(|| format!("archiving {}", rel.display()))?;
                stats.hardlinks += 1;
                continue;
            }
            if md.nlink() > 1 {
                linked.insert(inode, rel.to_path_buf());
            }
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            builder
                .append_data(&mut header, rel, file)
                .with_context(|| format!("archiving {}", rel.display()))?;
            stats.files += 1;
        } else {
            warn!("skipping special file {}", rel.display());
            stats.skipped += 1;
        }
    }

    let encoder = builder
        .into_inner()
        .with_context(|| format!("finishing tar stream for {}", output.display()))?;
    encoder
        .finish()
        .with_context(|| format!("finishing gzip stream for {}", output.display()))?;
    Ok(stats)
}

/// Absolute, symlink-free path of `output`, whose parent already exists.
fn resolve_output(parent: &Path, output: &Path) -> Result<PathBuf> {
    let real_parent = parent
        .canonicalize()
        .with_context(|| format!("resolving {}", parent.display()))?;
    match output.file_name() {
        Some(name) => Ok(real_parent.join(name)),
        None => bail!("archive path '{}' does not name a file", output.display()),
    }
}
