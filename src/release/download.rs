//! Release package download over HTTP(S) or from a local `file://` mirror.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

/// Download `url` to `dest`, replacing any existing file.
///
/// The body is streamed to a `.part` file and renamed into place once
/// complete, so a failed transfer never leaves a truncated package behind.
/// `file://` URLs are copied from the local filesystem (local mirrors).
pub fn download_to_file(url: &str, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating download directory '{}'", parent.display()))?;
    }

    let part = dest.with_extension("part");
    let mut file =
        File::create(&part).with_context(|| format!("creating '{}'", part.display()))?;

    let copied = match url.strip_prefix("file://") {
        Some(local) => File::open(local)
            .with_context(|| format!("not found on mirror: {url}"))
            .and_then(|mut src| Ok(std::io::copy(&mut src, &mut file)?)),
        None => ureq::get(url)
            .call()
            .map_err(|e| map_ureq_error(url, e))
            .and_then(|response| {
                Ok(std::io::copy(&mut response.into_body().as_reader(), &mut file)?)
            }),
    };
    drop(file);

    let written = match copied {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&part);
            return Err(e.context(format!("writing download of {url} to '{}'", part.display())));
        }
    };

    if written == 0 {
        let _ = fs::remove_file(&part);
        bail!("download of {url} returned an empty body");
    }

    fs::rename(&part, dest).with_context(|| {
        format!(
            "moving '{}' into place at '{}'",
            part.display(),
            dest.display()
        )
    })?;
    Ok(written)
}

fn map_ureq_error(url: &str, err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::StatusCode(404) => anyhow::anyhow!("not found on mirror: {url}"),
        ureq::Error::StatusCode(code) => anyhow::anyhow!("HTTP {code} fetching {url}"),
        other => anyhow::Error::new(other).context(format!("fetching {url}")),
    }
}

/// SHA-256 and size of a file.
pub fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let f = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}
