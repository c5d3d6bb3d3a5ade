//! URL to filesystem path resolution.

use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Decoded path part of a request URL, without query or fragment.
pub fn url_path(url: &str) -> Cow<'_, str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    percent_decode_str(path).decode_utf8_lossy()
}

/// File under `root` that answers `url`, with `index.html` for directories.
///
/// Anything resolving outside `root` (`..`, encoded or via symlinks) is
/// treated as missing.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let decoded = url_path(url);
    let rel = decoded.trim_matches('/');

    if rel.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }

    let root = root.canonicalize().ok()?;
    let candidate = root.join(rel).canonicalize().ok()?;
    if !candidate.starts_with(&root) {
        return None;
    }

    if candidate.is_dir() {
        let index = candidate.join("index.html");
        return index.is_file().then_some(index);
    }
    candidate.is_file().then_some(candidate)
}
