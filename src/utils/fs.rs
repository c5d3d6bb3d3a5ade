//! Output file helpers.
//!
//! Outputs are written to a temp file in the destination directory and then
//! renamed into place, so a reader never sees a half-written file.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `contents` to `path`, creating parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Copy `src` to `dst` atomically.
pub fn copy_atomic(src: &Path, dst: &Path) -> io::Result<()> {
    let bytes = fs::read(src)?;
    write_atomic(dst, &bytes)
}

/// Remove a directory tree. Missing directories are not an error.
///
/// Returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lexically resolve `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dist/css/bundle.min.css");

        write_atomic(&path, b"a{color:red}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a{color:red}");

        write_atomic(&path, b"b{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b{}");

        // no temp files left behind
        let entries = fs::read_dir(dir.path().join("dist/css")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_copy_atomic() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.woff2");
        fs::write(&src, [0u8, 1, 2]).unwrap();

        let dst = dir.path().join("dist/fonts/a.woff2");
        copy_atomic(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), vec![0u8, 1, 2]);
    }

    #[test]
    fn test_remove_dir_if_exists() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("dist");
        fs::create_dir_all(target.join("css")).unwrap();

        assert!(remove_dir_if_exists(&target).unwrap());
        assert!(!target.exists());
        assert!(!remove_dir_if_exists(&target).unwrap());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/site/./css/../js/app.js")),
            PathBuf::from("/site/js/app.js")
        );
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }
}
